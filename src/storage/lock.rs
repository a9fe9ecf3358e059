//! Per-namespace mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per username.
///
/// Entries are created on first use and dropped again once no caller holds
/// or waits for them, so renamed-away usernames don't accumulate.
#[derive(Debug, Default)]
pub struct NamespaceLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl NamespaceLocks {
    /// Create an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, username: &str) -> Arc<Mutex<()>> {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .entry(username.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Remove the entry for `username` unless another caller still has it.
    fn release(&self, username: &str, lock: Arc<Mutex<()>>) {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference is ours, one is the table's.
        if Arc::strong_count(&lock) == 2 {
            table.remove(username);
        }
    }

    /// Run `f` while holding the lock for `username`.
    pub fn with_namespace<T>(&self, username: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.entry(username);
        let result = {
            // A panic in another holder leaves nothing half-updated in the lock itself.
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(username, lock);
        result
    }

    /// Run `f` while holding the locks of two namespaces.
    ///
    /// Locks are taken in lexical order so concurrent callers cannot deadlock.
    pub fn with_namespaces<T>(&self, a: &str, b: &str, f: impl FnOnce() -> T) -> T {
        if a == b {
            return self.with_namespace(a, f);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first_lock = self.entry(first);
        let second_lock = self.entry(second);
        let result = {
            let _first = first_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let _second = second_lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(second, second_lock);
        self.release(first, first_lock);
        result
    }

    /// Number of namespaces currently locked or waited for.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no namespace is locked or waited for.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_with_namespace_returns_value() {
        let locks = NamespaceLocks::new();
        let value = locks.with_namespace("alice", || 42);
        assert_eq!(value, 42);
    }

    #[test]
    fn test_entries_are_dropped_after_use() {
        let locks = NamespaceLocks::new();

        locks.with_namespace("alice", || {
            assert_eq!(locks.len(), 1);
        });
        locks.with_namespaces("alice", "bob", || {
            assert_eq!(locks.len(), 2);
        });

        assert!(locks.is_empty());
    }

    #[test]
    fn test_same_namespace_is_serialized() {
        let locks = Arc::new(NamespaceLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    locks.with_namespace("alice", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_with_namespaces_same_name_does_not_deadlock() {
        let locks = NamespaceLocks::new();
        let value = locks.with_namespaces("alice", "alice", || "ok");
        assert_eq!(value, "ok");
    }

    #[test]
    fn test_with_namespaces_opposite_order() {
        let locks = Arc::new(NamespaceLocks::new());

        let a = {
            let locks = locks.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    locks.with_namespaces("alice", "bob", || ());
                }
            })
        };
        let b = {
            let locks = locks.clone();
            thread::spawn(move || {
                for _ in 0..50 {
                    locks.with_namespaces("bob", "alice", || ());
                }
            })
        };

        a.join().unwrap();
        b.join().unwrap();
        assert!(locks.is_empty());
    }
}
