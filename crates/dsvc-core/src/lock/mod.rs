//! Per-dataset mutual exclusion for commits.
//!
//! Commits on one dataset are serialized through a named lock; commits on
//! different datasets never contend. The service is a trait so a single
//! process can use [`InProcessLockService`] while several processes sharing
//! one database use the lease-backed implementation in `dsvc-store`.
//!
//! Callers hold a [`LockGuard`], which releases the lock on every exit path
//! (success, error, panic unwinding).

mod in_process;

pub use in_process::InProcessLockService;

use std::time::Duration;
use uuid::Uuid;

use crate::errors::{Result, VersioningError};

/// Prefix of every commit lock key
pub const COMMIT_LOCK_PREFIX: &str = "dataset-version-commit";

/// Lock key serializing commits on one dataset
pub fn commit_lock_key(dataset_id: &str) -> String {
    format!("{}:{}", COMMIT_LOCK_PREFIX, dataset_id)
}

/// Proof of ownership for an acquired lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    key: String,
    owner: String,
}

impl LockToken {
    /// Fresh token with a unique owner id
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            owner: Uuid::now_v7().to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }
}

/// A named, exclusive, time-bounded lock.
pub trait DatasetLockService: Send + Sync {
    /// Block until `key` is free or `timeout` elapses.
    ///
    /// # Errors
    /// `LockTimeout` when the key is still held at the deadline;
    /// `Persistence` when a shared backend cannot be reached.
    fn acquire(&self, key: &str, timeout: Duration) -> Result<LockToken>;

    /// Release a lock held by `token`. Releasing a lock that has since been
    /// taken over (expired lease) is a no-op.
    ///
    /// # Errors
    /// `Persistence` when a shared backend cannot be reached.
    fn release(&self, token: &LockToken) -> Result<()>;
}

/// Build the timeout error for `key`
pub fn lock_timeout(key: &str, timeout: Duration) -> VersioningError {
    VersioningError::LockTimeout {
        key: key.to_string(),
        timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
    }
}

/// RAII guard releasing its lock when dropped.
pub struct LockGuard<'a> {
    service: &'a dyn DatasetLockService,
    token: Option<LockToken>,
}

impl<'a> LockGuard<'a> {
    /// Acquire `key` on `service` and wrap the token.
    ///
    /// # Errors
    /// As [`DatasetLockService::acquire`].
    pub fn acquire(
        service: &'a dyn DatasetLockService,
        key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let token = service.acquire(key, timeout)?;
        Ok(Self {
            service,
            token: Some(token),
        })
    }

    pub fn key(&self) -> &str {
        self.token.as_ref().map(LockToken::key).unwrap_or_default()
    }

    /// Release now and report the outcome instead of logging it.
    ///
    /// # Errors
    /// As [`DatasetLockService::release`].
    pub fn release(mut self) -> Result<()> {
        match self.token.take() {
            Some(token) => self.service.release(&token),
            None => Ok(()),
        }
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            if let Err(err) = self.service.release(&token) {
                tracing::warn!(
                    lock_key = token.key(),
                    err_code = err.code(),
                    "Failed to release lock; it will be reclaimed when its lease expires"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;

    #[test]
    fn test_commit_lock_key_format() {
        assert_eq!(commit_lock_key("ds-1"), "dataset-version-commit:ds-1");
    }

    #[test]
    fn test_tokens_have_unique_owners() {
        let a = LockToken::new("k");
        let b = LockToken::new("k");
        assert_eq!(a.key(), b.key());
        assert_ne!(a.owner(), b.owner());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let service = InProcessLockService::new();
        {
            let _guard = LockGuard::acquire(&service, "k", Duration::from_millis(10)).unwrap();
            assert!(service.is_held("k"));
        }
        assert!(!service.is_held("k"));
    }

    #[test]
    fn test_guard_releases_on_panic() {
        let service = InProcessLockService::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = LockGuard::acquire(&service, "k", Duration::from_millis(10)).unwrap();
            panic!("boom");
        }));
        assert!(result.is_err());
        assert!(!service.is_held("k"));
    }

    #[test]
    fn test_timeout_error_kind() {
        let err: crate::errors::ExError = lock_timeout("k", Duration::from_millis(50)).into();
        assert_eq!(err.kind(), ExErrorKind::LockTimeout);
        assert!(err.message().contains("50"));
    }
}
