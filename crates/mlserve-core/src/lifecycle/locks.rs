//! Per-model mutual exclusion for artifact writers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Lock table keyed by model id.
///
/// Retrain and delete on one id run one at a time; different ids never wait
/// on each other.
#[derive(Debug, Default)]
pub struct ModelLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ModelLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, model_id: &str) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(model_id.to_string()).or_default())
    }

    /// Drops the slot once no other caller holds or waits on it.
    ///
    /// Clones are only handed out under the table lock, so a count of two
    /// (table plus `slot`) means nobody else can reach it.
    fn release(&self, model_id: &str, slot: &Arc<Mutex<()>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(slot) == 2 {
            slots.remove(model_id);
        }
    }

    /// Runs `f` while holding the lock for `model_id`.
    ///
    /// The slot lives only while someone uses it, so ids that never existed
    /// leave nothing behind.
    pub fn with_lock<T>(&self, model_id: &str, f: impl FnOnce() -> T) -> T {
        let slot = self.slot(model_id);
        let result = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release(model_id, &slot);
        result
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_same_id_is_serialized() {
        let locks = Arc::new(ModelLocks::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    locks.with_lock("m1", || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(10));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    });
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_released_after_use() {
        let locks = ModelLocks::new();
        locks.with_lock("a", || ());
        let nested = locks.with_lock("b", || {
            locks.with_lock("c", || ());
            locks.len()
        });
        assert_eq!(nested, 1);
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn test_slot_kept_while_another_caller_waits() {
        let locks = Arc::new(ModelLocks::new());
        let (entered_tx, entered_rx) = std::sync::mpsc::channel();

        let holder = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || {
                locks.with_lock("m1", || {
                    entered_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(50));
                });
            })
        };
        entered_rx.recv().unwrap();
        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || locks.with_lock("m1", || ()))
        };

        holder.join().unwrap();
        waiter.join().unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn test_with_lock_returns_value() {
        let locks = ModelLocks::new();
        assert_eq!(locks.with_lock("m1", || 42), 42);
    }
}
