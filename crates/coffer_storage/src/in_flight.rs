//! Per-hash serialization of saves.
//!
//! Two uploads of identical bytes arriving together would otherwise both see
//! "no record", both write the file and both create metadata. Saves take the
//! lock for their hash first, so the second one observes the first one's
//! record and takes the dedup branch.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Table of locks keyed by content hash.
///
/// Entries exist only while some task holds or waits on them.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl InFlight {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Wait until no other save for `hash` is running, then hold it.
    pub(crate) async fn acquire(&self, hash: &str) -> HashGuard<'_> {
        let lock = self.locks.entry(hash.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        HashGuard {
            table: self,
            hash: hash.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of hashes with a holder or waiter.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

/// Held lock for one hash; releases and prunes the table entry on drop.
pub(crate) struct HashGuard<'a> {
    table: &'a InFlight,
    hash: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for HashGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the table's own reference left means nobody is waiting
        self.table
            .locks
            .remove_if(&self.hash, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_entry_pruned_after_release() {
        let table = InFlight::new();
        {
            let _guard = table.acquire("abc").await;
            assert_eq!(table.len(), 1);
        }
        assert_eq!(table.len(), 0);
    }

    #[tokio::test]
    async fn test_distinct_hashes_do_not_block() {
        let table = InFlight::new();
        let _a = table.acquire("aaa").await;
        let b = tokio::time::timeout(Duration::from_millis(100), table.acquire("bbb")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_hash_waits_for_holder() {
        let table = Arc::new(InFlight::new());
        let first = table.acquire("abc").await;

        let waiter = {
            let table = Arc::clone(&table);
            tokio::spawn(async move {
                let _guard = table.acquire("abc").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(first);
        waiter.await.unwrap();
        assert_eq!(table.len(), 0);
    }
}
