mod execution;
mod worker;

use crate::{
    backlog::BacklogCounter,
    config::EngineConfig,
    engine::{
        execution::Execution,
        worker::{Message, Shared, TaskRef},
    },
    plan::ExecutionPlan,
    queue::WorkQueue,
    sync::{Mutex, lock, thread},
    task::TaskState,
};
use core::fmt;
use std::{io, sync::Arc};
use thiserror::Error;
use tracing::error;

/// Error kind for engine construction and execution failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The engine was configured with zero workers.
    #[error("engine requires at least one worker")]
    NoWorkers,
    /// A worker thread could not be spawned. Workers spawned before it were
    /// shut down and joined.
    #[error("failed to spawn worker thread {worker}")]
    Spawn {
        /// Index of the worker that failed to start.
        worker: usize,
        /// Error reported by the OS.
        #[source]
        source: io::Error,
    },
    /// At least one task body panicked during an execution.
    #[error(
        "workflow `{workflow}` finished with {} failed and {} skipped task(s)",
        .failed.len(),
        .skipped.len()
    )]
    TasksFailed {
        /// Name of the executed plan.
        workflow: String,
        /// Tasks whose body panicked, in plan order.
        failed: Vec<TaskFailure>,
        /// Tasks not run because a dependency failed or was skipped, in plan
        /// order.
        skipped: Vec<String>,
    },
}

/// A task whose body panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Task name.
    pub task: String,
    /// Panic payload rendered as text.
    pub message: String,
}

/// Outcome of a drained execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Execution id, unique per engine.
    pub execution: u64,
    /// Name of the executed plan.
    pub workflow: String,
    /// Number of tasks whose body returned normally.
    pub succeeded: usize,
    /// Tasks whose body panicked, in plan order.
    pub failed: Vec<TaskFailure>,
    /// Tasks not run because a dependency did not succeed, in plan order.
    pub skipped: Vec<String>,
}

impl ExecutionReport {
    /// Whether every task succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// How [`Engine::run_workflow`] returns.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Return once every task of the submitted execution has settled.
    #[default]
    Block,
    /// Return right after submission. Completion can be polled through
    /// [`Engine::is_backlog_complete`] or the returned [`ExecutionHandle`].
    DoNotBlock,
}

/// Fixed pool of worker threads executing [`ExecutionPlan`]s.
///
/// Every submission materializes a fresh set of runtime tasks and enqueues all
/// of them in plan order. A worker that dequeues a task blocks on the
/// completion of each of its dependencies before running the body, so a body
/// starts strictly after the bodies of all its dependencies returned, and
/// observes their memory effects.
///
/// Dropping the engine sends one termination sentinel per worker and joins
/// them all. Tasks queued ahead of the sentinels still run.
///
/// ```
/// use cwf::{engine::{Engine, RunMode}, plan::WorkflowBuilder};
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let counter = Arc::new(AtomicUsize::new(0));
/// let mut builder = WorkflowBuilder::new("count");
/// for name in ["a", "b", "c"] {
///     let counter = Arc::clone(&counter);
///     builder.task(name, move || {
///         counter.fetch_add(1, Ordering::Relaxed);
///     })?;
/// }
/// let plan = builder.build()?;
///
/// let engine = Engine::new(2)?;
/// engine.run_workflow(&plan, RunMode::Block)?;
/// engine.run_workflow(&plan, RunMode::Block)?;
/// assert_eq!(counter.load(Ordering::Relaxed), 6);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Engine {
    shared: Arc<Shared>,
    workers: Vec<thread::JoinHandle<()>>,
    /// Submission lock; also hands out execution ids.
    next_execution: Mutex<u64>,
}

impl Engine {
    /// Spawn an engine with `workers` threads and default configuration.
    ///
    /// # Errors
    /// See [`Engine::with_config`].
    pub fn new(workers: usize) -> Result<Self, EngineError> {
        Self::with_config(EngineConfig::new(workers))
    }

    /// Spawn an engine from `config`.
    ///
    /// # Errors
    /// - [`EngineError::NoWorkers`] if `config.workers` is zero.
    /// - [`EngineError::Spawn`] if a worker thread cannot be spawned.
    pub fn with_config(config: EngineConfig) -> Result<Self, EngineError> {
        let EngineConfig {
            workers,
            thread_name,
            stack_size,
            observer,
        } = config;
        if workers == 0 {
            return Err(EngineError::NoWorkers);
        }
        let mut engine = Self {
            shared: Arc::new(Shared {
                queue: WorkQueue::new(),
                backlog: BacklogCounter::new(),
                observer,
            }),
            workers: Vec::with_capacity(workers),
            next_execution: Mutex::new(0),
        };
        for worker in 0..workers {
            let mut builder = thread::Builder::new().name(format!("{thread_name}-{worker}"));
            if let Some(stack_size) = stack_size {
                builder = builder.stack_size(stack_size);
            }
            let shared = Arc::clone(&engine.shared);
            match builder.spawn(move || worker::run(worker, &shared)) {
                Ok(handle) => engine.workers.push(handle),
                // Dropping `engine` terminates and joins the workers spawned so
                // far.
                Err(source) => return Err(EngineError::Spawn { worker, source }),
            }
        }
        Ok(engine)
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.len()
    }

    /// Materialize and enqueue one execution of `plan`.
    ///
    /// Submissions are serialized by an engine-wide lock, so the tasks of one
    /// execution are enqueued contiguously and in plan order. Each execution
    /// owns its runtime tasks, so further submissions may follow before earlier
    /// ones have drained.
    ///
    /// # Errors
    /// With [`RunMode::Block`]: [`EngineError::TasksFailed`] if a task body
    /// panicked. With [`RunMode::DoNotBlock`] this never fails; outcomes are
    /// reported by [`ExecutionHandle::wait`].
    pub fn run_workflow(
        &self,
        plan: &ExecutionPlan,
        mode: RunMode,
    ) -> Result<ExecutionHandle, EngineError> {
        let Shared {
            queue,
            backlog,
            observer,
        } = &*self.shared;
        let execution = {
            let mut next_execution = lock(&self.next_execution);
            let id = *next_execution;
            *next_execution = id.wrapping_add(1);

            let execution = Arc::new(Execution::materialize(id, plan));
            let len = execution.len();
            backlog.up(len);
            observer.execution_submitted(id, plan.name(), len);
            for index in 0..len {
                queue.produce(Message::Run(TaskRef {
                    execution: Arc::clone(&execution),
                    index,
                }));
            }
            if len == 0 {
                observer.execution_completed(id, plan.name());
            }
            execution
        };

        let handle = ExecutionHandle { execution };
        if mode == RunMode::Block {
            handle.wait()?;
        }
        Ok(handle)
    }

    /// Whether every task submitted so far has settled. Never blocks.
    #[must_use]
    pub fn is_backlog_complete(&self) -> bool {
        self.shared.backlog.is_zero()
    }

    /// Block until every task submitted so far has settled.
    pub fn wait_for_backlog(&self) {
        self.shared.backlog.wait_for_zero();
    }

    /// Number of submitted tasks that have not settled yet.
    #[must_use]
    pub fn backlog(&self) -> usize {
        self.shared.backlog.count()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let Shared {
            queue, observer, ..
        } = &*self.shared;
        observer.shutdown_requested(self.workers.len());
        for _ in &self.workers {
            queue.produce(Message::Terminate);
        }
        for (worker, handle) in self.workers.drain(..).enumerate() {
            if handle.join().is_err() {
                error!(worker, "worker thread panicked");
            }
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("workers", &self.workers.len())
            .field("backlog", &self.shared.backlog)
            .finish_non_exhaustive()
    }
}

/// Handle to one submitted execution.
#[derive(Debug, Clone)]
pub struct ExecutionHandle {
    execution: Arc<Execution>,
}

impl ExecutionHandle {
    /// Execution id, unique per engine.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.execution.id
    }

    /// Name of the executed plan.
    #[must_use]
    pub fn workflow(&self) -> &str {
        &self.execution.workflow
    }

    /// Number of tasks in this execution.
    #[must_use]
    pub fn len(&self) -> usize {
        self.execution.len()
    }

    /// Whether this execution has no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.execution.len() == 0
    }

    /// Whether every task of this execution has settled. Never blocks.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.execution.backlog.is_zero()
    }

    /// Current state of the task called `name`.
    #[must_use]
    pub fn task_state(&self, name: &str) -> Option<TaskState> {
        self.execution.task_state(name)
    }

    /// Block until every task of this execution has settled.
    ///
    /// # Errors
    /// [`EngineError::TasksFailed`] if a task body panicked.
    pub fn wait(&self) -> Result<ExecutionReport, EngineError> {
        self.execution.backlog.wait_for_zero();
        let report = self.execution.report();
        if report.is_success() {
            return Ok(report);
        }
        let ExecutionReport {
            workflow,
            failed,
            skipped,
            ..
        } = report;
        Err(EngineError::TasksFailed {
            workflow,
            failed,
            skipped,
        })
    }
}
