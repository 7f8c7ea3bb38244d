//! Per-group mutual exclusion for open/close transitions.
//!
//! Row locks taken inside the transaction serialize writers on databases that
//! support them; this registry serializes transitions of the same group inside
//! the process regardless of backend. Different groups never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per group id
#[derive(Debug, Clone, Default)]
pub struct GroupLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl GroupLocks {
    /// Creates an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `group_id`; released when the guard drops.
    ///
    /// Entries nobody holds or waits on are dropped on the way in, so the
    /// registry stays as large as the number of groups currently in flight.
    pub async fn acquire(&self, group_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // Only the map references an idle entry
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(group_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of groups currently tracked
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// Whether no group is tracked
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_group_is_exclusive() {
        let locks = GroupLocks::new();
        let guard = locks.acquire(1).await;

        let contender = locks.clone();
        let attempt =
            tokio::time::timeout(Duration::from_millis(50), contender.acquire(1)).await;
        assert!(attempt.is_err(), "second acquire should wait for the first guard");

        drop(guard);
        let attempt =
            tokio::time::timeout(Duration::from_millis(50), contender.acquire(1)).await;
        assert!(attempt.is_ok());
    }

    #[tokio::test]
    async fn test_different_groups_do_not_contend() {
        let locks = GroupLocks::new();
        let _one = locks.acquire(1).await;
        let two = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(two.is_ok());
        assert_eq!(locks.len().await, 2);
        assert!(!locks.is_empty().await);
    }

    #[tokio::test]
    async fn test_released_groups_are_pruned() {
        let locks = GroupLocks::new();
        for group_id in 1..=50 {
            let guard = locks.acquire(group_id).await;
            drop(guard);
        }
        // Only the last entry survives; every earlier one was idle when pruned
        assert_eq!(locks.len().await, 1);

        let held = locks.acquire(7).await;
        let _other = locks.acquire(8).await;
        assert_eq!(locks.len().await, 2);

        // A held lock is never pruned, so a second caller still waits on it
        let contender = locks.clone();
        let attempt =
            tokio::time::timeout(Duration::from_millis(50), contender.acquire(7)).await;
        assert!(attempt.is_err());
        drop(held);
    }
}
