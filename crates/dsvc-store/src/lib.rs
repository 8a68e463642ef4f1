//! dsvc Store - SQLite persistence for dataset version control
//!
//! Provides:
//! - Connection setup (WAL, foreign keys, busy timeout)
//! - Embedded schema migrations with checksums
//! - Row-level repositories for datasets, draft items, versions and tags
//! - A lease-based commit lock shared between processes

pub mod db;
pub mod errors;
pub mod lease_lock;
pub mod migrations;
pub mod repo;

// Re-export key types
pub use errors::Result;
pub use lease_lock::SqliteLeaseLockService;
