//! Canonical logging macros
//!
//! Field names come from `dsvc_core_types::schema` so every crate emits the
//! same keys.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use dsvc_core::log_op_start;
/// log_op_start!("commit_version");
/// log_op_start!("commit_version", dataset_id = "ds-1");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    }};
    ($op:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    }};
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use dsvc_core::log_op_end;
/// log_op_end!("commit_version", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    }};
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    }};
}

/// Log an operation error
///
/// The error is converted (by clone) into an `ExError` so the stable code is
/// always present; the original value stays usable afterwards.
///
/// # Example
///
/// ```
/// # use dsvc_core::{log_op_error, errors::VersioningError};
/// let err = VersioningError::DatasetNotFound { dataset_id: "ds-1".to_string() };
/// log_op_error!("commit_version", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone(&$err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        let ex_err: $crate::errors::ExError = ::std::clone::Clone::clone(&$err).into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            err_message = ex_err.message(),
            $($field)*
        );
    }};
}

/// Log a phase transition inside an operation at debug level
///
/// # Example
///
/// ```
/// # use dsvc_core::log_phase;
/// log_phase!("commit_version", "diffing", dataset_id = "ds-1");
/// ```
#[macro_export]
macro_rules! log_phase {
    ($op:expr, $phase:expr) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            phase = $phase,
        );
    }};
    ($op:expr, $phase:expr, $($field:tt)*) => {{
        tracing::debug!(
            component = module_path!(),
            op = $op,
            phase = $phase,
            $($field)*
        );
    }};
}
