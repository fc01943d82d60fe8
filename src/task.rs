use crate::sync::{AtomicU8, Condvar, Mutex, Ordering, lock, wait};
use core::fmt;
use derive_more::Display;

/// Lifecycle of one runtime task within a single execution.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Not settled yet: queued, waiting on dependencies, or running.
    Pending = 0,
    /// The body returned normally.
    Succeeded = 1,
    /// The body panicked.
    Failed = 2,
    /// The body was not run because a dependency did not succeed.
    Skipped = 3,
}

impl TaskState {
    /// Whether this is a terminal state.
    #[must_use]
    pub fn is_settled(self) -> bool {
        self != Self::Pending
    }

    fn from_repr(repr: u8) -> Self {
        match repr {
            0 => Self::Pending,
            1 => Self::Succeeded,
            2 => Self::Failed,
            3 => Self::Skipped,
            _ => unreachable!("TaskState::from_repr: [1]"),
        }
    }
}

/// One-shot completion signal of a runtime task.
///
/// The state is published with a Release store while holding the lock, so a
/// waiter that observes a settled state (Acquire) also observes every memory
/// effect of the task body that preceded [`Completion::settle`].
///
/// Waiting is a fast-path atomic load followed, only when still pending, by a
/// condvar loop that re-checks under the same lock the setter takes. A waiter
/// that arrives after settlement never blocks.
pub struct Completion {
    state: AtomicU8,
    lock: Mutex<()>,
    settled: Condvar,
}

impl Completion {
    /// Create a pending signal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(TaskState::Pending as u8),
            lock: Mutex::new(()),
            settled: Condvar::new(),
        }
    }

    /// Current state, without blocking.
    #[must_use]
    pub fn state(&self) -> TaskState {
        TaskState::from_repr(self.state.load(Ordering::Acquire))
    }

    /// Publish a terminal state and wake every waiter.
    ///
    /// # Panics
    /// If `state` is [`TaskState::Pending`], or if the signal was already
    /// settled. A rejected call leaves the published state untouched.
    pub fn settle(&self, state: TaskState) {
        assert!(state.is_settled(), "Completion::settle: [1]");
        let guard = lock(&self.lock);
        let swapped = self.state.compare_exchange(
            TaskState::Pending as u8,
            state as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        drop(guard);
        assert!(swapped.is_ok(), "Completion::settle: [2]");
        self.settled.notify_all();
    }

    /// Block until the signal is settled and return the terminal state.
    pub fn wait(&self) -> TaskState {
        let state = self.state();
        if state.is_settled() {
            return state;
        }
        let mut guard = lock(&self.lock);
        loop {
            let state = self.state();
            if state.is_settled() {
                return state;
            }
            guard = wait(&self.settled, guard);
        }
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
