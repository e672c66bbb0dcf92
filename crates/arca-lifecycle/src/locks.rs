use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{LifecycleError, LifecycleResult};

/// One mutex per object name.
///
/// Version numbers are allocated by scanning the versions of a name and
/// taking the maximum, so two concurrent allocations for the same name must
/// not interleave. Different names never contend. An entry is dropped once
/// no caller holds or waits on it.
#[derive(Debug, Default)]
pub struct LineageLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LineageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock guarding `name`, created on first use.
    pub fn lock_for(&self, name: &str) -> LifecycleResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|e| LifecycleError::Backend(format!("lineage lock registry poisoned: {e}")))?;
        Ok(locks.entry(name.to_string()).or_default().clone())
    }

    /// Run `f` while holding the lock for `name`.
    pub fn with_lock<T>(
        &self,
        name: &str,
        f: impl FnOnce() -> LifecycleResult<T>,
    ) -> LifecycleResult<T> {
        let lock = self.lock_for(name)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(e) => Err(LifecycleError::Backend(format!(
                "lineage lock for {name:?} poisoned: {e}"
            ))),
        };
        self.release(name, lock);
        result
    }

    fn release(&self, name: &str, lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.locks.lock() else {
            return;
        };
        // The map and `lock` itself: nobody else is queued on this name.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(name);
        }
    }

    /// Number of names with a live lock.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_shares_a_lock() {
        let locks = LineageLocks::new();
        let a = locks.lock_for("spec").unwrap();
        let b = locks.lock_for("spec").unwrap();
        let c = locks.lock_for("other").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn with_lock_returns_result() {
        let locks = LineageLocks::new();
        assert_eq!(locks.with_lock("x", || Ok(7)).unwrap(), 7);
    }

    #[test]
    fn released_names_are_pruned() {
        let locks = LineageLocks::new();
        for i in 0..100 {
            locks.with_lock(&format!("name-{i}"), || Ok(())).unwrap();
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn held_lock_is_not_pruned() {
        let locks = LineageLocks::new();
        let held = locks.lock_for("spec").unwrap();
        locks.with_lock("spec", || Ok(())).unwrap();
        assert_eq!(locks.len(), 1);
        assert!(Arc::ptr_eq(&held, &locks.lock_for("spec").unwrap()));
    }

    #[test]
    fn contended_name_is_pruned_after_last_holder() {
        let locks = Arc::new(LineageLocks::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        locks.with_lock("spec", || Ok(())).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(locks.is_empty());
    }
}
