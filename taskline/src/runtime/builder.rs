use super::observer::{TaskObserver, TracingObserver};
use super::pool::ThreadPool;

use std::sync::Arc;
use std::thread;

const DEFAULT_THREAD_NAME: &str = "taskline-pool";

/// Builder for configuring and creating a [`ThreadPool`].
///
/// `ThreadPoolBuilder` allows customizing the pool before constructing it:
/// the number of workers, the name of their threads and the observer
/// notified around every task.
///
/// # Examples
///
/// ```rust,ignore
/// let pool = ThreadPoolBuilder::new()
///     .worker_count(4)
///     .thread_name("compute")
///     .build();
/// ```
pub struct ThreadPoolBuilder {
    /// Number of worker threads in the pool.
    worker_count: usize,

    /// Worker threads are named `<thread_name>-<index>`.
    thread_name: String,

    observer: Arc<dyn TaskObserver>,
}

impl ThreadPoolBuilder {
    /// Creates a new `ThreadPoolBuilder` with default configuration.
    ///
    /// By default, the number of workers is set to the number of available
    /// logical CPUs, falling back to `1` if unavailable, and tasks are
    /// reported to a [`TracingObserver`].
    pub fn new() -> Self {
        let worker_count = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_count,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Sets the number of worker threads.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let builder = ThreadPoolBuilder::new()
    ///     .worker_count(2);
    /// ```
    pub fn worker_count(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_count must be > 0");

        self.worker_count = n;
        self
    }

    /// Sets the prefix of the worker thread names.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Sets the observer notified around every task.
    pub fn observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Builds a pool with the configured options.
    ///
    /// The pool is not started.
    pub fn build(self) -> ThreadPool {
        ThreadPool::from_parts(self.worker_count, self.thread_name, self.observer)
    }
}

impl Default for ThreadPoolBuilder {
    /// Creates a default `ThreadPoolBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
