//! Per-user mutual exclusion for read-modify-write runs.
//!
//! Materialization and surplus allocation both read the ledger, compute, and
//! write back. Two concurrent runs for the same user could create the same
//! recurring entry twice or advance a template twice, so every such run holds
//! the user's lock for its whole duration. Runs for different users never
//! contend.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct UserLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and returns the lock guard for `user_id`.
    pub async fn acquire(&self, user_id: &str) -> OwnedMutexGuard<()> {
        self.prune_idle();
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Number of users with a lock entry. Idle entries linger until the
    /// next `acquire`.
    pub fn tracked_users(&self) -> usize {
        self.locks.len()
    }

    // An entry only referenced by the map has no holder and no waiter.
    fn prune_idle(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}
