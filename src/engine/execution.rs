use crate::{
    backlog::BacklogCounter,
    engine::{ExecutionReport, TaskFailure},
    plan::ExecutionPlan,
    sync::{Mutex, lock},
    task::{Completion, TaskState},
    types::{IndexMap, TaskFn},
};
use derive_more::Debug;
use std::sync::Arc;

/// One task of one execution.
#[derive(Debug)]
pub(super) struct RuntimeTask {
    pub(super) name: Arc<str>,
    #[debug(skip)]
    pub(super) function: TaskFn,
    /// Positions of the dependencies inside the same execution's arena.
    pub(super) dependencies: Box<[usize]>,
    pub(super) completion: Completion,
}

/// Runtime task set materialized from a plan for a single submission.
///
/// The arena is a boxed slice: it is sized once and can never grow, and every
/// queued task reference owns an `Arc` of the execution. Dependency links are
/// positions, so nothing a worker holds can dangle, no matter how many other
/// submissions follow.
#[derive(Debug)]
pub(super) struct Execution {
    pub(super) id: u64,
    pub(super) workflow: Arc<str>,
    pub(super) tasks: Box<[RuntimeTask]>,
    /// Shared with the plan: task name -> arena position.
    #[debug(skip)]
    positions: Arc<IndexMap<Arc<str>, usize>>,
    /// Tasks of this execution that have not settled yet.
    pub(super) backlog: BacklogCounter,
    /// Panicked tasks as `(position, failure)`, in the order they panicked.
    #[debug(skip)]
    failures: Mutex<Vec<(usize, TaskFailure)>>,
}

impl Execution {
    pub(super) fn materialize(id: u64, plan: &ExecutionPlan) -> Self {
        let tasks: Box<[RuntimeTask]> = plan
            .tasks()
            .iter()
            .map(|task| RuntimeTask {
                name: Arc::clone(task.shared_name()),
                function: Arc::clone(task.function()),
                dependencies: task.dependencies().into(),
                completion: Completion::new(),
            })
            .collect();
        Self {
            id,
            workflow: Arc::clone(plan.shared_name()),
            positions: Arc::clone(plan.positions()),
            backlog: BacklogCounter::with_count(tasks.len()),
            tasks,
            failures: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(super) fn record_failure(&self, position: usize, message: String) {
        let failure = TaskFailure {
            task: self.tasks[position].name.to_string(),
            message,
        };
        lock(&self.failures).push((position, failure));
    }

    pub(super) fn task_state(&self, name: &str) -> Option<TaskState> {
        let &position = self.positions.get(name)?;
        Some(self.tasks[position].completion.state())
    }

    /// Summarize a drained execution.
    ///
    /// # Panics
    /// If called before every task has settled.
    pub(super) fn report(&self) -> ExecutionReport {
        let mut succeeded = 0;
        let mut skipped = Vec::new();
        for task in self.tasks.iter() {
            match task.completion.state() {
                TaskState::Succeeded => succeeded += 1,
                TaskState::Skipped => skipped.push(task.name.to_string()),
                TaskState::Failed => {}
                TaskState::Pending => unreachable!("Execution::report: [1]"),
            }
        }
        let mut failures = lock(&self.failures).clone();
        failures.sort_unstable_by_key(|&(position, _)| position);
        ExecutionReport {
            execution: self.id,
            workflow: self.workflow.to_string(),
            succeeded,
            failed: failures.into_iter().map(|(_, failure)| failure).collect(),
            skipped,
        }
    }
}
