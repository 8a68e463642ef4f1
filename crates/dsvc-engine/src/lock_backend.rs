//! Lock service selection from configuration.

use dsvc_core::config::{LockBackend, LockConfig};
use dsvc_core::lock::{DatasetLockService, InProcessLockService};
use dsvc_store::errors::Result;
use dsvc_store::SqliteLeaseLockService;
use std::path::Path;

/// Build the lock service named by `config.backend`.
///
/// The lease backend opens its own connection to the store at `db_path` so
/// lock polling never competes with the commit transaction's connection.
///
/// # Errors
/// `Persistence` when the lease backend cannot open the store.
pub fn build_lock_service(
    config: &LockConfig,
    db_path: &Path,
) -> Result<Box<dyn DatasetLockService>> {
    tracing::debug!(backend = ?config.backend, "Building lock service");
    match config.backend {
        LockBackend::InProcess => Ok(Box::new(InProcessLockService::new())),
        LockBackend::SqliteLease => Ok(Box::new(SqliteLeaseLockService::open(
            db_path,
            config.lease(),
            config.poll_interval(),
        )?)),
    }
}
