mod builder;

/// Error returned by [`WorkflowBuilder`] when a declaration or the declared
/// graph as a whole is invalid.
pub use crate::plan::builder::BuildError;
/// Accumulates named task declarations and sorts them into an
/// [`ExecutionPlan`].
pub use crate::plan::builder::WorkflowBuilder;
use crate::types::{IndexMap, TaskFn};
use derive_more::{Debug, Deref};
use std::sync::Arc;

/// Immutable, reusable, topologically ordered list of tasks.
///
/// Produced once by [`WorkflowBuilder::build`] and then executed any number of
/// times. Cloning is cheap: the task list is shared.
///
/// Invariant: every dependency position of the task at position `p` is
/// strictly less than `p`.
#[must_use]
#[derive(Debug, Clone, Deref)]
pub struct ExecutionPlan {
    name: Arc<str>,
    #[deref(forward)]
    tasks: Arc<[PlanTask]>,
    /// Task name -> position in `tasks`.
    #[debug(skip)]
    positions: Arc<IndexMap<Arc<str>, usize>>,
}

/// A task inside an [`ExecutionPlan`], with dependencies resolved to positions
/// in the same plan.
#[must_use]
#[derive(Debug, Clone)]
pub struct PlanTask {
    name: Arc<str>,
    #[debug(skip)]
    function: TaskFn,
    dependencies: Box<[usize]>,
}

impl ExecutionPlan {
    pub(crate) fn new(name: Arc<str>, tasks: Vec<PlanTask>) -> Self {
        debug_assert!(
            tasks
                .iter()
                .enumerate()
                .all(|(pos, task)| task.dependencies.iter().all(|&dep| dep < pos)),
            "ExecutionPlan::new: [1]"
        );
        let positions = tasks
            .iter()
            .enumerate()
            .map(|(pos, task)| (Arc::clone(&task.name), pos))
            .collect();
        Self {
            name,
            tasks: tasks.into(),
            positions: Arc::new(positions),
        }
    }

    /// Name given to the workflow builder.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Tasks in topological order.
    #[must_use]
    pub fn tasks(&self) -> &[PlanTask] {
        &self.tasks
    }

    /// Position of the task called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// The task called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PlanTask> {
        self.position(name).map(|pos| &self.tasks[pos])
    }

    pub(crate) fn positions(&self) -> &Arc<IndexMap<Arc<str>, usize>> {
        &self.positions
    }
}

impl PlanTask {
    pub(crate) fn new(name: Arc<str>, function: TaskFn, dependencies: Box<[usize]>) -> Self {
        Self {
            name,
            function,
            dependencies,
        }
    }

    /// Unique task name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Task body.
    #[must_use]
    pub fn function(&self) -> &TaskFn {
        &self.function
    }

    /// Positions of this task's dependencies in the owning plan, each strictly
    /// less than this task's own position.
    #[must_use]
    pub fn dependencies(&self) -> &[usize] {
        &self.dependencies
    }
}
