use crate::observe::{EngineObserver, TracingObserver};
use derive_more::Debug;
use std::{sync::Arc, thread};

/// Configuration entry-point for instantiating the [`Engine`].
///
/// ```
/// use cwf::{config::EngineConfig, observe::NoopObserver};
/// use std::sync::Arc;
///
/// let config = EngineConfig::new(2)
///     .with_thread_name("render")
///     .with_observer(Arc::new(NoopObserver));
/// assert_eq!(config.workers, 2);
/// ```
///
/// [`Engine`]: crate::engine::Engine
#[must_use]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of worker threads. Must be at least one.
    pub workers: usize,
    /// Prefix of worker thread names; worker `i` is called `{thread_name}-{i}`.
    pub thread_name: String,
    /// Stack size of worker threads, or the platform default.
    pub stack_size: Option<usize>,
    /// Receiver of engine events.
    #[debug(skip)]
    pub observer: Arc<dyn EngineObserver>,
}

impl EngineConfig {
    /// Configuration with `workers` threads and defaults for everything else.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            thread_name: "cwf-worker".to_owned(),
            stack_size: None,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    /// Set the worker thread stack size.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Replace the default [`TracingObserver`].
    pub fn with_observer(mut self, observer: Arc<dyn EngineObserver>) -> Self {
        self.observer = observer;
        self
    }
}

impl Default for EngineConfig {
    /// One worker per available CPU, or four if that cannot be determined.
    fn default() -> Self {
        let workers = thread::available_parallelism().map_or(4, usize::from);
        Self::new(workers)
    }
}
