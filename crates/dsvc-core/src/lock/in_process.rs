use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{lock_timeout, DatasetLockService, LockToken};
use crate::errors::Result;

/// Lock service for a single process: a held-key table plus a condition
/// variable that wakes waiters on every release.
#[derive(Default)]
pub struct InProcessLockService {
    held: Mutex<HashMap<String, String>>,
    released: Condvar,
}

impl InProcessLockService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held.lock().contains_key(key)
    }
}

impl DatasetLockService for InProcessLockService {
    fn acquire(&self, key: &str, timeout: Duration) -> Result<LockToken> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock();
        while held.contains_key(key) {
            let waited = self.released.wait_until(&mut held, deadline);
            if waited.timed_out() && held.contains_key(key) {
                return Err(lock_timeout(key, timeout).into());
            }
        }

        let token = LockToken::new(key);
        held.insert(key.to_string(), token.owner().to_string());
        tracing::trace!(lock_key = key, "Lock acquired");
        Ok(token)
    }

    fn release(&self, token: &LockToken) -> Result<()> {
        let mut held = self.held.lock();
        if held.get(token.key()).map(String::as_str) == Some(token.owner()) {
            held.remove(token.key());
            self.released.notify_all();
            tracing::trace!(lock_key = token.key(), "Lock released");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExErrorKind;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_second_acquire_times_out() {
        let service = InProcessLockService::new();
        let _token = service.acquire("k", Duration::from_millis(10)).unwrap();
        let err = service.acquire("k", Duration::from_millis(20)).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::LockTimeout);
    }

    #[test]
    fn test_distinct_keys_do_not_contend() {
        let service = InProcessLockService::new();
        let _a = service.acquire("a", Duration::from_millis(10)).unwrap();
        assert!(service.acquire("b", Duration::from_millis(10)).is_ok());
    }

    #[test]
    fn test_stale_token_cannot_release_new_holder() {
        let service = InProcessLockService::new();
        let first = service.acquire("k", Duration::from_millis(10)).unwrap();
        service.release(&first).unwrap();
        let _second = service.acquire("k", Duration::from_millis(10)).unwrap();
        service.release(&first).unwrap();
        assert!(service.is_held("k"));
    }

    #[test]
    fn test_waiter_wakes_on_release() {
        let service = Arc::new(InProcessLockService::new());
        let token = service.acquire("k", Duration::from_millis(10)).unwrap();

        let waiter = {
            let service = Arc::clone(&service);
            thread::spawn(move || service.acquire("k", Duration::from_secs(5)).is_ok())
        };
        thread::sleep(Duration::from_millis(30));
        service.release(&token).unwrap();

        assert!(waiter.join().unwrap());
    }
}
