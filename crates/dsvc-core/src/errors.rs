use dsvc_core_types::RequestId;
use thiserror::Error;

/// Result type alias using the canonical ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// raised by the version-control engine. Each kind maps to a stable error
/// code that callers (CLI, an upstream REST layer, tests) match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Unknown dataset, version hash or tag reference
    NotFound,
    /// Duplicate tag name within a dataset, duplicate dataset name
    Conflict,
    /// Malformed input: reserved tag, bad reference string, bad paging
    Validation,
    /// Dataset is busy with a concurrent commit
    LockTimeout,
    /// Data-layer failure; the in-progress unit of work was rolled back
    Persistence,
    /// JSON payload could not be encoded or decoded
    Serialization,
    /// Configuration file is unreadable or invalid
    Config,
    /// Broken internal invariant
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Conflict => "ERR_CONFLICT",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::LockTimeout => "ERR_LOCK_TIMEOUT",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether a caller may safely retry the same request.
    ///
    /// An uncommitted version never becomes visible, so retrying after a
    /// lock timeout or a rolled-back persistence failure cannot duplicate it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExErrorKind::LockTimeout | ExErrorKind::Persistence)
    }
}

/// Canonical structured error type
///
/// Carries the classification used for programmatic handling plus the
/// context (operation, dataset, reference, tag, request) needed to debug it.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    dataset_id: Option<String>,
    version_ref: Option<String>,
    tag: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            dataset_id: None,
            version_ref: None,
            tag: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add dataset context
    pub fn with_dataset_id(mut self, id: impl Into<String>) -> Self {
        self.dataset_id = Some(id.into());
        self
    }

    /// Add version reference context (hash, tag or the draft sentinel as given)
    pub fn with_version_ref(mut self, version_ref: impl Into<String>) -> Self {
        self.version_ref = Some(version_ref.into());
        self
    }

    /// Add tag context
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Whether the failed request can be retried as-is
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the dataset context, if any
    pub fn dataset_id(&self) -> Option<&str> {
        self.dataset_id.as_deref()
    }

    /// Get the version reference context, if any
    pub fn version_ref(&self) -> Option<&str> {
        self.version_ref.as_deref()
    }

    /// Get the tag context, if any
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.code(), self.kind)?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(dataset_id) = &self.dataset_id {
            write!(f, " (dataset_id: {})", dataset_id)?;
        }
        if let Some(version_ref) = &self.version_ref {
            write!(f, " (ref: {})", version_ref)?;
        }
        if let Some(tag) = &self.tag {
            write!(f, " (tag: {})", tag)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain-level failures raised by validation rules and the resolver.
///
/// These carry the typed detail; they cross crate boundaries as [`ExError`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VersioningError {
    // ===== Lookup =====
    #[error("Dataset not found: {dataset_id}")]
    DatasetNotFound { dataset_id: String },

    #[error("Version reference '{reference}' matches no tag or version hash in dataset {dataset_id}")]
    ReferenceNotFound {
        dataset_id: String,
        reference: String,
    },

    #[error("Version not found: {version_hash}")]
    VersionNotFound {
        dataset_id: String,
        version_hash: String,
    },

    // ===== Conflicts =====
    #[error("Tag '{tag}' already exists in dataset {dataset_id}")]
    TagAlreadyExists { dataset_id: String, tag: String },

    #[error("Dataset named '{name}' already exists in workspace {workspace_id}")]
    DatasetNameTaken { workspace_id: String, name: String },

    // ===== Validation =====
    #[error("Tag 'latest' is managed by commits and cannot be deleted")]
    LatestTagProtected { dataset_id: String },

    #[error("Tag name '{tag}' is reserved")]
    ReservedTagName { tag: String },

    #[error("Invalid tag '{tag}': {reason}")]
    InvalidTagName { tag: String, reason: String },

    #[error("Invalid version reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Operation '{op}' requires a committed version, not the draft")]
    DraftNotAllowed { op: String },

    #[error("Invalid page request: {reason}")]
    InvalidPage { reason: String },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // ===== Concurrency =====
    #[error("Lock '{key}' not acquired within {timeout_ms} ms")]
    LockTimeout { key: String, timeout_ms: u64 },

    // ===== Generic =====
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<VersioningError> for ExError {
    fn from(err: VersioningError) -> Self {
        let message = err.to_string();
        let ex = match err {
            VersioningError::DatasetNotFound { dataset_id } => {
                ExError::new(ExErrorKind::NotFound).with_dataset_id(dataset_id)
            }
            VersioningError::ReferenceNotFound {
                dataset_id,
                reference,
            } => ExError::new(ExErrorKind::NotFound)
                .with_dataset_id(dataset_id)
                .with_version_ref(reference),
            VersioningError::VersionNotFound {
                dataset_id,
                version_hash,
            } => ExError::new(ExErrorKind::NotFound)
                .with_dataset_id(dataset_id)
                .with_version_ref(version_hash),
            VersioningError::TagAlreadyExists { dataset_id, tag } => {
                ExError::new(ExErrorKind::Conflict)
                    .with_dataset_id(dataset_id)
                    .with_tag(tag)
            }
            VersioningError::DatasetNameTaken { .. } => ExError::new(ExErrorKind::Conflict),
            VersioningError::LatestTagProtected { dataset_id } => {
                ExError::new(ExErrorKind::Validation)
                    .with_dataset_id(dataset_id)
                    .with_tag(crate::model::LATEST_TAG)
            }
            VersioningError::ReservedTagName { tag }
            | VersioningError::InvalidTagName { tag, .. } => {
                ExError::new(ExErrorKind::Validation).with_tag(tag)
            }
            VersioningError::InvalidReference { reference, .. } => {
                ExError::new(ExErrorKind::Validation).with_version_ref(reference)
            }
            VersioningError::DraftNotAllowed { op } => {
                ExError::new(ExErrorKind::Validation).with_op(op)
            }
            VersioningError::InvalidPage { .. } | VersioningError::InvalidInput { .. } => {
                ExError::new(ExErrorKind::Validation)
            }
            VersioningError::LockTimeout { .. } => ExError::new(ExErrorKind::LockTimeout),
            VersioningError::Serialization { .. } => ExError::new(ExErrorKind::Serialization),
            VersioningError::Internal { .. } => ExError::new(ExErrorKind::Internal),
        };
        ex.with_message(message)
    }
}

impl From<serde_json::Error> for VersioningError {
    fn from(err: serde_json::Error) -> Self {
        VersioningError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        VersioningError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes_are_stable() {
        assert_eq!(ExErrorKind::NotFound.code(), "ERR_NOT_FOUND");
        assert_eq!(ExErrorKind::Conflict.code(), "ERR_CONFLICT");
        assert_eq!(ExErrorKind::Validation.code(), "ERR_VALIDATION");
        assert_eq!(ExErrorKind::LockTimeout.code(), "ERR_LOCK_TIMEOUT");
        assert_eq!(ExErrorKind::Persistence.code(), "ERR_PERSISTENCE");
    }

    #[test]
    fn test_retryable_kinds() {
        assert!(ExErrorKind::LockTimeout.is_retryable());
        assert!(ExErrorKind::Persistence.is_retryable());
        assert!(!ExErrorKind::Conflict.is_retryable());
        assert!(!ExErrorKind::NotFound.is_retryable());
        assert!(!ExErrorKind::Validation.is_retryable());
    }

    #[test]
    fn test_tag_conflict_maps_to_conflict_kind() {
        let err: ExError = VersioningError::TagAlreadyExists {
            dataset_id: "ds-1".to_string(),
            tag: "gold".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::Conflict);
        assert_eq!(err.dataset_id(), Some("ds-1"));
        assert_eq!(err.tag(), Some("gold"));
        assert!(err.message().contains("gold"));
    }

    #[test]
    fn test_latest_protection_is_validation() {
        let err: ExError = VersioningError::LatestTagProtected {
            dataset_id: "ds-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ExErrorKind::Validation);
        assert_eq!(err.tag(), Some("latest"));
    }

    #[test]
    fn test_display_includes_code_op_and_context() {
        let err = ExError::new(ExErrorKind::NotFound)
            .with_op("resolve")
            .with_dataset_id("ds-9")
            .with_version_ref("v-missing")
            .with_message("no such ref");
        let text = err.to_string();
        assert!(text.starts_with("[ERR_NOT_FOUND]"));
        assert!(text.contains("'resolve'"));
        assert!(text.contains("ds-9"));
        assert!(text.contains("v-missing"));
    }

    #[test]
    fn test_serde_error_becomes_serialization() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: ExError = bad.into();
        assert_eq!(err.kind(), ExErrorKind::Serialization);
    }
}
