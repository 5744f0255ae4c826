//! Per-session write locks.
//!
//! The engine allows any number of sessions to progress concurrently but
//! exactly one frame per session to be in flight. This map hands out one
//! async mutex per session id.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// In-memory map of per-session mutexes.
///
/// Locks are created on first use and kept for the process lifetime;
/// session ids are few enough that the map is never reaped.
#[derive(Default)]
pub struct SessionLocks {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `session_id`, creating it on first use.
    ///
    /// The returned guard is owned, so it can be held across awaits while
    /// the session's frame is handled.
    pub async fn lock(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let existing = {
            let locks = self.locks.read().await;
            locks.get(session_id).cloned()
        };
        let mutex = match existing {
            Some(mutex) => mutex,
            None => {
                let mut locks = self.locks.write().await;
                locks
                    .entry(session_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(())))
                    .clone()
            }
        };
        mutex.lock_owned().await
    }
}
