use crate::{
    plan::{ExecutionPlan, PlanTask},
    types::{IndexMap, IndexSet, TaskFn},
};
use derive_more::Debug;
use std::{collections::VecDeque, sync::Arc};
use thiserror::Error;

/// Error kind for workflow declaration and planning failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BuildError {
    /// A task with the same name is already registered. The rejected
    /// registration left the builder unchanged.
    #[error("task `{name}` is already registered")]
    DuplicateTaskName {
        /// The offending name.
        name: String,
    },
    /// A task depends on a name that was never registered.
    #[error("task `{task}` depends on `{dependency}`, which was never registered")]
    MissingDependency {
        /// The task declaring the dependency.
        task: String,
        /// The unregistered dependency name.
        dependency: String,
    },
    /// The declared graph contains cycle(s). Lists every task that could not be
    /// ordered: members of a cycle and everything downstream of one.
    #[error("cyclic dependency among tasks: {}", .tasks.join(", "))]
    CyclicDependency {
        /// Names of the tasks left unordered, in registration order.
        tasks: Vec<String>,
    },
}

#[derive(Debug)]
struct TaskSpec {
    #[debug(skip)]
    function: TaskFn,
    dependencies: IndexSet<String>,
}

/// Accumulates named task declarations and sorts them into an
/// [`ExecutionPlan`].
///
/// Dependencies are referenced by name and may point forward to tasks that are
/// declared later; existence is only checked by [`WorkflowBuilder::build`].
///
/// ```
/// use cwf::plan::WorkflowBuilder;
///
/// let mut builder = WorkflowBuilder::new("frame");
/// builder
///     .task_with_deps("Camera", || {}, ["Input"])?
///     .task("Input", || {})?
///     .task_final("Present", || {})?;
/// let plan = builder.build()?;
/// assert_eq!(plan.position("Input"), Some(0));
/// assert_eq!(plan.tasks()[2].dependencies(), &[1, 0]);
/// # Ok::<(), cwf::plan::BuildError>(())
/// ```
#[must_use]
#[derive(Debug, Default)]
pub struct WorkflowBuilder {
    name: String,
    tasks: IndexMap<String, TaskSpec>,
}

impl WorkflowBuilder {
    /// Start declaring a workflow called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: IndexMap::default(),
        }
    }

    /// Register a task without dependencies.
    ///
    /// # Errors
    /// [`BuildError::DuplicateTaskName`] if `name` is already registered.
    pub fn task<F>(&mut self, name: impl Into<String>, function: F) -> Result<&mut Self, BuildError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(name.into(), Arc::new(function), IndexSet::default())
    }

    /// Register a task depending on every name in `dependencies`.
    ///
    /// The order of `dependencies` is irrelevant and repeated names collapse
    /// into one edge.
    ///
    /// # Errors
    /// [`BuildError::DuplicateTaskName`] if `name` is already registered.
    pub fn task_with_deps<F, I, S>(
        &mut self,
        name: impl Into<String>,
        function: F,
        dependencies: I,
    ) -> Result<&mut Self, BuildError>
    where
        F: Fn() + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dependencies = dependencies.into_iter().map(Into::into).collect();
        self.register(name.into(), Arc::new(function), dependencies)
    }

    /// Register a task depending on every task registered so far.
    ///
    /// Tasks registered afterwards are not dependencies of this one.
    ///
    /// # Errors
    /// [`BuildError::DuplicateTaskName`] if `name` is already registered.
    pub fn task_final<F>(
        &mut self,
        name: impl Into<String>,
        function: F,
    ) -> Result<&mut Self, BuildError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let name = name.into();
        let dependencies = self
            .tasks
            .keys()
            .filter(|existing| **existing != name)
            .cloned()
            .collect();
        self.register(name, Arc::new(function), dependencies)
    }

    /// Number of registered tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether a task called `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    fn register(
        &mut self,
        name: String,
        function: TaskFn,
        dependencies: IndexSet<String>,
    ) -> Result<&mut Self, BuildError> {
        if self.tasks.contains_key(&name) {
            return Err(BuildError::DuplicateTaskName { name });
        }
        self.tasks.insert(
            name,
            TaskSpec {
                function,
                dependencies,
            },
        );
        Ok(self)
    }

    /// Validate the declarations and sort them topologically (Kahn's
    /// algorithm).
    ///
    /// Among simultaneously ready tasks the earliest registered goes first, so
    /// identical declarations always produce the identical plan.
    ///
    /// # Panics
    /// In case of internal invariant violations. Impossible if there are no
    /// bugs in the code.
    ///
    /// # Errors
    /// - [`BuildError::MissingDependency`] if a dependency name was never
    ///   registered.
    /// - [`BuildError::CyclicDependency`] if the graph contains cycle(s).
    pub fn build(self) -> Result<ExecutionPlan, BuildError> {
        // Example:
        //
        //   A     B
        //    \   /
        //      C
        //      |
        //      D
        //
        // - Seeds: A, B (no dependencies), in registration order.
        // - Placing A leaves C with one unresolved dependency; placing B
        //   releases C; placing C releases D.
        // - Output: A, B, C, D with C -> [0, 1] and D -> [2].
        let Self { name, tasks } = self;
        let num_tasks = tasks.len();

        // Phase 1: Resolve dependency names to registration indices. Doing this
        // before sorting keeps an unregistered name from leaving its dependent
        // stuck, which would otherwise be misreported as a cycle.
        // - dependency_indices: task -> registration indices of its dependencies.
        // - dependents: task -> registration indices of tasks depending on it.
        // - unresolved: task -> number of dependencies not yet placed.
        let mut dependency_indices = Vec::with_capacity(num_tasks);
        let mut dependents = vec![Vec::new(); num_tasks];
        let mut unresolved = Vec::with_capacity(num_tasks);
        for (task_idx, (task_name, spec)) in tasks.iter().enumerate() {
            let mut resolved = Vec::with_capacity(spec.dependencies.len());
            for dependency in &spec.dependencies {
                let Some(dep_idx) = tasks.get_index_of(dependency) else {
                    return Err(BuildError::MissingDependency {
                        task: task_name.clone(),
                        dependency: dependency.clone(),
                    });
                };
                dependents[dep_idx].push(task_idx);
                resolved.push(dep_idx);
            }
            unresolved.push(resolved.len());
            dependency_indices.push(resolved);
        }

        // Phase 2: Seed the ready list with independent tasks.
        let mut ready: VecDeque<usize> = unresolved
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count == 0)
            .map(|(task_idx, _)| task_idx)
            .collect();

        // Phase 3: Kahn loop. Every placed task removes one edge from each of
        // its dependents; a dependent whose count drops to zero becomes ready.
        let mut order = Vec::with_capacity(num_tasks);
        while let Some(task_idx) = ready.pop_front() {
            order.push(task_idx);
            for &dependent in &dependents[task_idx] {
                let count = &mut unresolved[dependent];
                *count = count.checked_sub(1).expect("WorkflowBuilder::build: [1]");
                if *count == 0 {
                    ready.push_back(dependent);
                }
            }
        }
        drop(dependents);

        // Phase 4: Anything still holding unresolved dependencies sits on or
        // behind a cycle (self-dependencies included).
        if order.len() != num_tasks {
            let stuck = unresolved
                .iter()
                .enumerate()
                .filter(|&(_, &count)| count != 0)
                .map(|(task_idx, _)| {
                    let (task_name, _) = tasks
                        .get_index(task_idx)
                        .expect("WorkflowBuilder::build: [2]");
                    task_name.clone()
                })
                .collect();
            return Err(BuildError::CyclicDependency { tasks: stuck });
        }

        // Phase 5: Map registration indices to output positions and
        // materialize the plan.
        let mut position = vec![usize::MAX; num_tasks];
        for (pos, &task_idx) in order.iter().enumerate() {
            position[task_idx] = pos;
        }
        let mut specs: Vec<_> = tasks.into_iter().map(Some).collect();
        let plan_tasks = order
            .iter()
            .enumerate()
            .map(|(pos, &task_idx)| {
                let (task_name, spec) = specs[task_idx]
                    .take()
                    .expect("WorkflowBuilder::build: [3]");
                let dependencies = dependency_indices[task_idx]
                    .iter()
                    .map(|&dep_idx| {
                        let dep_pos = position[dep_idx];
                        assert!(dep_pos < pos, "WorkflowBuilder::build: [4]");
                        dep_pos
                    })
                    .collect();
                PlanTask::new(task_name.into(), spec.function, dependencies)
            })
            .collect();

        Ok(ExecutionPlan::new(name.into(), plan_tasks))
    }
}
