#![allow(clippy::unwrap_used, clippy::expect_used)]

use dsvc_core::errors::{ExError, ExErrorKind, VersioningError};
use dsvc_core::logging_facility::test_capture::init_test_capture;
use dsvc_core::{log_op_end, log_op_error, log_op_start, log_phase};
use dsvc_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name, dataset_id = "ds-log-1");

    let events = capture.events_with("dataset_id", "ds-log-1");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].op.as_deref(), Some(op_name));
    assert_eq!(events[0].event.as_deref(), Some(EVENT_START));
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let end_events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_kind_and_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = VersioningError::TagAlreadyExists {
        dataset_id: "ds-log-3".to_string(),
        tag: "gold".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);
    // The macro leaves the error usable
    let ex: ExError = err.into();
    assert_eq!(ex.kind(), ExErrorKind::Conflict);

    let error_events: Vec<_> = capture
        .events()
        .into_iter()
        .filter(|e| {
            e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR)
        })
        .collect();
    assert_eq!(error_events.len(), 1);
    assert_eq!(error_events[0].field("err_code"), Some("ERR_CONFLICT"));
    assert_eq!(error_events[0].field("err_kind"), Some("Conflict"));
    assert_eq!(error_events[0].level, tracing::Level::ERROR);
}

#[test]
fn test_log_phase_is_debug_level() {
    let capture = init_test_capture();

    log_phase!("test_log_phase_unique_4", "diffing", dataset_id = "ds-log-4");

    let events = capture.events_with("dataset_id", "ds-log-4");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].field("phase"), Some("diffing"));
    assert_eq!(events[0].level, tracing::Level::DEBUG);
}

#[test]
fn test_capture_is_the_installed_subscriber() {
    let first = init_test_capture();
    let second = init_test_capture();
    assert!(tracing::dispatcher::has_been_set());

    log_op_start!("test_capture_shared_unique_5", dataset_id = "ds-log-5");

    // Both handles see the same process-wide capture
    assert_eq!(first.events_with("dataset_id", "ds-log-5").len(), 1);
    assert_eq!(second.events_with("dataset_id", "ds-log-5").len(), 1);
}
