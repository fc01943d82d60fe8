use crate::sync::{Condvar, Mutex, lock, wait};
use core::fmt;

/// Monitor-style count of outstanding tasks.
///
/// The count and the "drained" condition share one lock, so a thread that
/// checks the count and then starts waiting cannot miss a concurrent
/// transition to zero.
pub struct BacklogCounter {
    outstanding: Mutex<usize>,
    drained: Condvar,
}

impl BacklogCounter {
    /// Create a counter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::with_count(0)
    }

    /// Create a counter starting at `count`.
    #[must_use]
    pub fn with_count(count: usize) -> Self {
        Self {
            outstanding: Mutex::new(count),
            drained: Condvar::new(),
        }
    }

    /// Add `n` outstanding tasks.
    ///
    /// # Panics
    /// If the count would overflow `usize`.
    pub fn up(&self, n: usize) {
        let mut outstanding = lock(&self.outstanding);
        *outstanding = outstanding
            .checked_add(n)
            .expect("BacklogCounter::up: [1]");
    }

    /// Remove `n` outstanding tasks, saturating at zero, and return the new
    /// count. Every thread blocked in [`Self::wait_for_zero`] is woken when the
    /// count reaches zero.
    pub fn down(&self, n: usize) -> usize {
        let mut outstanding = lock(&self.outstanding);
        *outstanding = outstanding.saturating_sub(n);
        let remaining = *outstanding;
        drop(outstanding);
        if remaining == 0 {
            self.drained.notify_all();
        }
        remaining
    }

    /// Block until the count is zero. Returns immediately if it already is.
    pub fn wait_for_zero(&self) {
        let mut outstanding = lock(&self.outstanding);
        while *outstanding != 0 {
            outstanding = wait(&self.drained, outstanding);
        }
    }

    /// Non-blocking snapshot: whether nothing is outstanding.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.count() == 0
    }

    /// Non-blocking snapshot of the outstanding count.
    #[must_use]
    pub fn count(&self) -> usize {
        *lock(&self.outstanding)
    }
}

impl Default for BacklogCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BacklogCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BacklogCounter")
            .field("outstanding", &self.count())
            .finish_non_exhaustive()
    }
}
