//! dsvc Core - domain kernel for dataset version control
//!
//! This crate holds everything about versioning that does not touch storage:
//! - Dataset, draft item, version and tag models
//! - Version reference parsing (tag, hash or the draft sentinel)
//! - The lineage-keyed item diff engine
//! - Input validation rules
//! - Per-dataset commit lock abstraction
//! - Error facility, logging facility and engine configuration

pub mod config;
pub mod diff;
pub mod errors;
pub mod lock;
pub mod logging_facility;
pub mod model;
pub mod reference;
pub mod rules;

/// Re-exported so the logging macros resolve schema constants from any crate
pub use dsvc_core_types as core_types;

// Re-export commonly used types
pub use config::EngineConfig;
pub use errors::{ExError, ExErrorKind, Result, VersioningError};
pub use lock::{DatasetLockService, InProcessLockService, LockGuard};
pub use model::{Dataset, DatasetVersion, DraftItem, ItemData, Page, VersionedItem};
pub use reference::{ResolvedRef, VersionRef};
