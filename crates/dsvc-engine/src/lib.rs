//! dsvc engine: dataset version-control operations.
//!
//! Coordinates the domain rules in `dsvc-core` with the SQLite store in
//! `dsvc-store`. Every operation takes the caller's context, is scoped to
//! the caller's workspace and logs one start and one end-or-error event.

pub mod commands;
pub mod lock_backend;

pub use commands::commit::{commit_version, CommitPhase, CommitRequest};
pub use commands::compare::{compare_versions, ComparisonResult};
pub use commands::engine_command::{apply_engine_command, EngineCommand, EngineCommandResult};
pub use commands::items::ItemsPage;
pub use commands::versions::VersionUpdate;
pub use commands::PageRequest;
pub use lock_backend::build_lock_service;
