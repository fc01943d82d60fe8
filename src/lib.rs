//! In-process DAG workflow scheduler backed by a fixed pool of worker threads.
//!
//! Callers declare named units of work with named dependencies. The
//! declarations are validated and topologically ordered once into an immutable
//! [`ExecutionPlan`](plan::ExecutionPlan), which an [`Engine`](engine::Engine)
//! then executes any number of times with dependency-respecting concurrency.
//!
//! Key modules:
//! - `plan`: `WorkflowBuilder` (duplicate, missing-dependency and cycle
//!   detection, Kahn's topological sort) and the resulting `ExecutionPlan`.
//! - `engine`: the worker pool. Every submission materializes fresh runtime
//!   tasks, enqueues all of them in plan order, and workers block on each
//!   dependency's completion before running a body.
//! - `queue`, `backlog`, `task`: the blocking FIFO, the outstanding-task
//!   monitor and the one-shot completion signal the engine is built from.
//! - `observe`: pluggable engine observer; `tracing`-backed by default.
//! - `config`, `logging`: engine configuration and subscriber setup.
//!
//! Quick start:
//! 1. Declare tasks on a `WorkflowBuilder` with `task`, `task_with_deps` or
//!    `task_final`, then `build` the plan.
//! 2. Spawn an `Engine` with the desired number of workers.
//! 3. Call `run_workflow` with `RunMode::Block`, or with `RunMode::DoNotBlock`
//!    and later poll `is_backlog_complete` / call `wait_for_backlog`.
//!
//! A task body starts only after the bodies of all its dependencies have
//! returned, and observes every memory effect they made. Nothing is guaranteed
//! about the relative order of independent tasks.

/// Outstanding-task monitor with blocking wait-for-zero.
pub mod backlog;
/// Engine configuration.
pub mod config;
/// The concurrent execution engine.
///
/// Contains the worker pool, per-submission runtime task arenas and the
/// blocking and non-blocking submission paths.
pub mod engine;
pub mod logging;
/// Observer hooks for engine activity.
pub mod observe;
/// Workflow declaration and the immutable execution plan.
///
/// Contains validation (duplicate names, missing dependencies, cycles) and the
/// topological sort.
pub mod plan;
/// Unbounded blocking FIFO used to hand tasks to workers.
pub mod queue;
mod sync;
/// Task lifecycle states and the one-shot completion signal.
pub mod task;
/// Common aliases used across the crate.
pub mod types;
