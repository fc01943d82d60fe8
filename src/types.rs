use indexmap::{IndexMap as _IndexMap, IndexSet as _IndexSet};
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

/// Body of a task: a zero-argument, side-effecting callable.
///
/// Shared by reference count between the [`ExecutionPlan`] and every
/// execution materialized from it.
///
/// [`ExecutionPlan`]: crate::plan::ExecutionPlan
pub type TaskFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// `IndexMap` type with fast hasher.
pub type IndexMap<K, V> = _IndexMap<K, V, FxBuildHasher>;
/// `IndexSet` type with fast hasher.
pub type IndexSet<T> = _IndexSet<T, FxBuildHasher>;
