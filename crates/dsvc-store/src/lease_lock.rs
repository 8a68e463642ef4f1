//! Database-backed commit lock for several processes sharing one store.
//!
//! A lock is a row in `dataset_locks` with an owner token and an expiry.
//! Taking a lock is a single upsert that only succeeds when no row exists or
//! the existing lease has expired, so a crashed holder blocks others for at
//! most one lease period. Release deletes the row only if the caller still
//! owns it.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use dsvc_core::errors::Result;
use dsvc_core::lock::{lock_timeout, DatasetLockService, LockToken};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::db;
use crate::errors::persistence;
use crate::repo::sql_int;

/// Lease-based [`DatasetLockService`] with its own connection.
pub struct SqliteLeaseLockService {
    conn: Mutex<Connection>,
    lease: Duration,
    poll_interval: Duration,
}

impl SqliteLeaseLockService {
    /// Open a dedicated connection to the store at `path`.
    ///
    /// # Errors
    /// `Persistence` when the store cannot be opened or migrated.
    pub fn open<P: AsRef<Path>>(path: P, lease: Duration, poll_interval: Duration) -> Result<Self> {
        let conn = db::open_store(path)?;
        Ok(Self::from_connection(conn, lease, poll_interval))
    }

    /// Wrap an already migrated connection
    pub fn from_connection(conn: Connection, lease: Duration, poll_interval: Duration) -> Self {
        Self {
            conn: Mutex::new(conn),
            lease,
            poll_interval,
        }
    }

    /// Owner of the current row for `key`, expired or not
    pub fn holder(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .lock()
            .query_row(
                "SELECT owner FROM dataset_locks WHERE lock_key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| persistence("lock_holder", e))
    }

    fn try_acquire(&self, token: &LockToken) -> Result<bool> {
        let now = Utc::now().timestamp_millis();
        let expires_at = now.saturating_add(sql_int(
            u64::try_from(self.lease.as_millis()).unwrap_or(u64::MAX),
        ));

        let changed = self
            .conn
            .lock()
            .execute(
                "INSERT INTO dataset_locks (lock_key, owner, acquired_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(lock_key) DO UPDATE SET
                    owner = excluded.owner,
                    acquired_at = excluded.acquired_at,
                    expires_at = excluded.expires_at
                 WHERE dataset_locks.expires_at <= excluded.acquired_at",
                rusqlite::params![token.key(), token.owner(), now, expires_at],
            )
            .map_err(|e| persistence("lock_acquire", e))?;

        Ok(changed == 1)
    }
}

impl DatasetLockService for SqliteLeaseLockService {
    fn acquire(&self, key: &str, timeout: Duration) -> Result<LockToken> {
        let token = LockToken::new(key);
        let deadline = Instant::now() + timeout;

        loop {
            if self.try_acquire(&token)? {
                tracing::trace!(lock_key = key, owner = token.owner(), "Lease acquired");
                return Ok(token);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(lock_timeout(key, timeout).into());
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    fn release(&self, token: &LockToken) -> Result<()> {
        let removed = self
            .conn
            .lock()
            .execute(
                "DELETE FROM dataset_locks WHERE lock_key = ?1 AND owner = ?2",
                [token.key(), token.owner()],
            )
            .map_err(|e| persistence("lock_release", e))?;

        if removed == 0 {
            tracing::warn!(
                lock_key = token.key(),
                "Lease was already taken over before release"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsvc_core::errors::ExErrorKind;

    fn service(lease_ms: u64) -> SqliteLeaseLockService {
        let conn = db::open_store_in_memory().unwrap();
        SqliteLeaseLockService::from_connection(
            conn,
            Duration::from_millis(lease_ms),
            Duration::from_millis(5),
        )
    }

    #[test]
    fn test_held_lease_blocks_until_timeout() {
        let locks = service(60_000);
        let token = locks.acquire("k", Duration::from_millis(10)).unwrap();
        assert_eq!(locks.holder("k").unwrap().as_deref(), Some(token.owner()));

        let err = locks.acquire("k", Duration::from_millis(30)).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::LockTimeout);
    }

    #[test]
    fn test_release_frees_the_key() {
        let locks = service(60_000);
        let token = locks.acquire("k", Duration::from_millis(10)).unwrap();
        locks.release(&token).unwrap();
        assert_eq!(locks.holder("k").unwrap(), None);
        assert!(locks.acquire("k", Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn test_expired_lease_is_taken_over() {
        let locks = service(20);
        let stale = locks.acquire("k", Duration::from_millis(10)).unwrap();
        std::thread::sleep(Duration::from_millis(40));

        let fresh = locks.acquire("k", Duration::from_millis(100)).unwrap();
        assert_ne!(stale.owner(), fresh.owner());

        // The previous owner can no longer release the new holder's lease
        locks.release(&stale).unwrap();
        assert_eq!(locks.holder("k").unwrap().as_deref(), Some(fresh.owner()));
    }
}
