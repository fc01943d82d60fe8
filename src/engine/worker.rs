use crate::{
    backlog::BacklogCounter,
    engine::execution::Execution,
    observe::{EngineObserver, WorkerState},
    queue::WorkQueue,
    task::TaskState,
};
use core::time::Duration;
use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};

/// Item travelling through the engine's work queue.
pub(super) enum Message {
    /// Run the task at `index` of `execution`.
    Run(TaskRef),
    /// Sentinel: the receiving worker exits its loop.
    Terminate,
}

pub(super) struct TaskRef {
    pub(super) execution: Arc<Execution>,
    pub(super) index: usize,
}

/// State shared by the engine handle and all of its workers.
pub(super) struct Shared {
    pub(super) queue: WorkQueue<Message>,
    /// Unsettled tasks across every in-flight execution.
    pub(super) backlog: BacklogCounter,
    pub(super) observer: Arc<dyn EngineObserver>,
}

/// Worker thread main loop.
pub(super) fn run(worker: usize, shared: &Shared) {
    let Shared {
        queue,
        backlog,
        observer,
    } = shared;
    let observer = observer.as_ref();
    observer.worker_state_changed(worker, WorkerState::Idle);
    loop {
        let Message::Run(task_ref) = queue.consume() else {
            observer.worker_state_changed(worker, WorkerState::Terminated);
            return;
        };
        observer.worker_state_changed(worker, WorkerState::Running);
        execute(worker, &task_ref, observer);

        // Engine-wide first: once an execution reports drained, its share of
        // the engine backlog is already gone.
        backlog.down(1);
        let TaskRef { execution, .. } = task_ref;
        if execution.backlog.down(1) == 0 {
            observer.execution_completed(execution.id, &execution.workflow);
        }
        observer.worker_state_changed(worker, WorkerState::Idle);
    }
}

/// Wait for every dependency, then run the body (or skip it when a dependency
/// did not succeed) and settle the task's completion signal.
fn execute(worker: usize, task_ref: &TaskRef, observer: &dyn EngineObserver) {
    let TaskRef { execution, index } = task_ref;
    let task = &execution.tasks[*index];
    observer.task_received(worker, execution.id, &task.name);

    let mut runnable = true;
    for &dependency in task.dependencies.iter() {
        debug_assert!(dependency < *index, "worker::execute: [1]");
        let dependency = &execution.tasks[dependency];
        observer.waiting_for_dependency(worker, &task.name, &dependency.name);
        runnable &= dependency.completion.wait() == TaskState::Succeeded;
    }

    let (state, elapsed) = if runnable {
        observer.task_started(worker, &task.name);
        let started = Instant::now();
        let result = panic::catch_unwind(AssertUnwindSafe(|| (*task.function)()));
        let elapsed = started.elapsed();
        match result {
            Ok(()) => (TaskState::Succeeded, elapsed),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                observer.task_panicked(worker, &task.name, &message);
                execution.record_failure(*index, message);
                (TaskState::Failed, elapsed)
            }
        }
    } else {
        (TaskState::Skipped, Duration::ZERO)
    };
    task.completion.settle(state);
    observer.task_finished(worker, &task.name, state, elapsed);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "<non-string panic payload>".to_owned()
    }
}
