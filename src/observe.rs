use crate::task::TaskState;
use core::time::Duration;
use derive_more::Display;
use tracing::{debug, trace, warn};

/// State machine of a single worker thread:
/// `Idle -> Running -> Idle -> ... -> Terminated`.
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WorkerState {
    /// Blocked on the work queue, or about to be.
    Idle,
    /// Holding a task: waiting on its dependencies or running its body.
    Running,
    /// Consumed its termination sentinel and exited the loop.
    Terminated,
}

/// Pluggable observer of engine activity.
///
/// Called from worker threads and from submitting threads, so implementations
/// must be cheap and must never block on engine operations. Every hook has an
/// empty default body.
pub trait EngineObserver: Send + Sync {
    /// A worker moved to `state`.
    fn worker_state_changed(&self, worker: usize, state: WorkerState) {
        let _ = (worker, state);
    }

    /// A plan was materialized and its tasks enqueued.
    fn execution_submitted(&self, execution: u64, workflow: &str, tasks: usize) {
        let _ = (execution, workflow, tasks);
    }

    /// A worker dequeued `task`.
    fn task_received(&self, worker: usize, execution: u64, task: &str) {
        let _ = (worker, execution, task);
    }

    /// A worker is about to wait on the completion of `dependency`.
    fn waiting_for_dependency(&self, worker: usize, task: &str, dependency: &str) {
        let _ = (worker, task, dependency);
    }

    /// All dependencies of `task` succeeded and its body is about to run.
    fn task_started(&self, worker: usize, task: &str) {
        let _ = (worker, task);
    }

    /// `task` settled. `elapsed` covers the body only and is zero for skipped
    /// tasks.
    fn task_finished(&self, worker: usize, task: &str, state: TaskState, elapsed: Duration) {
        let _ = (worker, task, state, elapsed);
    }

    /// The body of `task` panicked with `message`.
    fn task_panicked(&self, worker: usize, task: &str, message: &str) {
        let _ = (worker, task, message);
    }

    /// The last task of an execution settled.
    fn execution_completed(&self, execution: u64, workflow: &str) {
        let _ = (execution, workflow);
    }

    /// The engine is shutting down `workers` workers.
    fn shutdown_requested(&self, workers: usize) {
        let _ = workers;
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

/// Observer emitting `tracing` events. This is the default observer.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingObserver;

impl EngineObserver for TracingObserver {
    fn worker_state_changed(&self, worker: usize, state: WorkerState) {
        match state {
            WorkerState::Terminated => debug!(worker, "received kill-task; exiting"),
            _ => trace!(worker, %state, "worker state changed"),
        }
    }

    fn execution_submitted(&self, execution: u64, workflow: &str, tasks: usize) {
        debug!(execution, workflow, tasks, "submitted workflow");
    }

    fn task_received(&self, worker: usize, execution: u64, task: &str) {
        trace!(worker, execution, task, "received task");
    }

    fn waiting_for_dependency(&self, worker: usize, task: &str, dependency: &str) {
        trace!(worker, task, dependency, "waiting for dependency");
    }

    fn task_started(&self, worker: usize, task: &str) {
        trace!(worker, task, "running task");
    }

    fn task_finished(&self, worker: usize, task: &str, state: TaskState, elapsed: Duration) {
        trace!(worker, task, %state, ?elapsed, "task settled");
    }

    fn task_panicked(&self, worker: usize, task: &str, message: &str) {
        warn!(worker, task, message, "task panicked");
    }

    fn execution_completed(&self, execution: u64, workflow: &str) {
        debug!(execution, workflow, "workflow drained");
    }

    fn shutdown_requested(&self, workers: usize) {
        debug!(workers, "sending kill-task to workers");
    }
}
