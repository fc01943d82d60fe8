use crate::sync::{Condvar, Mutex, lock, wait};
use core::fmt;
use std::collections::VecDeque;

/// Unbounded FIFO hand-off queue between submitters and workers.
///
/// `produce` never blocks; `consume` parks the calling thread until an item is
/// available. Items are handed out strictly in the order they were produced.
///
/// There is no close operation: consumers are stopped by producing a
/// sentinel value of `T` that the consumer recognises (the engine produces one
/// `Terminate` message per worker).
pub struct WorkQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> WorkQueue<T> {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Append `item` to the tail and wake at most one blocked consumer.
    pub fn produce(&self, item: T) {
        lock(&self.items).push_back(item);
        self.available.notify_one();
    }

    /// Remove and return the head, blocking while the queue is empty.
    pub fn consume(&self) -> T {
        let mut items = lock(&self.items);
        loop {
            if let Some(item) = items.pop_front() {
                return item;
            }
            items = wait(&self.available, items);
        }
    }

    /// Number of queued items at the time of the call.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    /// Whether the queue was empty at the time of the call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

impl<T> Default for WorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WorkQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkQueue")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
