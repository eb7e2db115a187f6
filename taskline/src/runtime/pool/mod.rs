//! Fixed-size pool of worker threads.
//!
//! The pool offers three kinds of runners:
//! - [`ThreadPool::get_task_runner`]: unsequenced, tasks may run concurrently
//!   on any worker,
//! - [`ThreadPool::create_sequenced_task_runner`]: a virtual sequence whose
//!   tasks run one at a time in post order, on any worker,
//! - [`ThreadPool::create_single_thread_task_runner`]: pinned to one worker
//!   thread.
//!
//! Internally every runner feeds a lane of one shared state. Virtual
//! sequences live in a slab and are claimed by the worker running one of
//! their tasks, which keeps them exclusive without dedicating a thread.

mod runner;
mod state;
mod worker;

use super::builder::ThreadPoolBuilder;
use super::observer::TaskObserver;
use super::task_runner::{SequencedTaskRunner, SingleThreadTaskRunner, TaskRunner};
use crate::error::{Error, Result};
use runner::{ParallelTaskRunner, PinnedTaskRunner, PooledSequencedTaskRunner};
use state::Shared;
use worker::Worker;

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

/// A pool of worker threads serving unsequenced, sequenced and pinned
/// task runners.
///
/// Runners can be created and posted to before [`start`](Self::start); the
/// work waits until the workers exist. [`stop`](Self::stop) lets running
/// tasks finish, discards everything still queued and joins the workers. A
/// stopped pool cannot be restarted.
///
/// # Examples
///
/// ```rust,ignore
/// let mut pool = ThreadPool::new(4);
/// pool.start()?;
///
/// let sequence = pool.create_sequenced_task_runner();
/// for i in 0..10 {
///     sequence.post_task(from_here!(), bind_once(move || println!("{i}"), ()));
/// }
///
/// pool.stop();
/// ```
pub struct ThreadPool {
    shared: Arc<Shared>,

    /// Prefix of the worker thread names.
    thread_name: String,

    phase: Phase,

    /// Join handles for worker threads.
    handles: Vec<JoinHandle<()>>,

    /// Shared by every caller of `get_task_runner`.
    parallel: Arc<ParallelTaskRunner>,
}

impl ThreadPool {
    /// Creates a stopped pool of `worker_count` workers with the default
    /// configuration.
    ///
    /// # Panics
    ///
    /// Panics if `worker_count == 0`.
    pub fn new(worker_count: usize) -> Self {
        ThreadPoolBuilder::new().worker_count(worker_count).build()
    }

    /// Returns a builder to configure a pool before creating it.
    pub fn builder() -> ThreadPoolBuilder {
        ThreadPoolBuilder::new()
    }

    pub(crate) fn from_parts(
        worker_count: usize,
        thread_name: String,
        observer: Arc<dyn TaskObserver>,
    ) -> Self {
        let shared = Arc::new(Shared::new(worker_count, observer));
        let parallel = Arc::new(ParallelTaskRunner::new(shared.clone()));

        Self {
            shared,
            thread_name,
            phase: Phase::Idle,
            handles: Vec::with_capacity(worker_count),
            parallel,
        }
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.shared.worker_count
    }

    /// Spawns the worker threads.
    ///
    /// If a thread cannot be spawned, the workers already spawned are
    /// stopped and the pool ends up stopped.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if the pool is started,
    /// - [`Error::PoolStopped`] if the pool was stopped,
    /// - [`Error::Spawn`] if the OS refused to create a thread.
    pub fn start(&mut self) -> Result<()> {
        match self.phase {
            Phase::Idle => {}
            Phase::Running => return Err(Error::AlreadyRunning(self.thread_name.clone())),
            Phase::Stopped => return Err(Error::PoolStopped),
        }

        for index in 0..self.worker_count() {
            let name = format!("{}-{}", self.thread_name, index);
            let worker = Worker::new(index, self.shared.clone());

            match thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker.run())
            {
                Ok(handle) => self.handles.push(handle),
                Err(source) => {
                    tracing::error!(thread = %name, error = %source, "failed to spawn pool worker");
                    self.stop();
                    return Err(Error::Spawn { name, source });
                }
            }
        }

        self.phase = Phase::Running;
        tracing::debug!(
            pool = %self.thread_name,
            workers = self.worker_count(),
            "thread pool started"
        );

        Ok(())
    }

    /// Stops the pool and joins every worker.
    ///
    /// Tasks already running finish. Every queued task, delayed or not, is
    /// dropped without running and every later post is rejected. Calling
    /// `stop` again does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called from a task running on one of the pool's workers.
    pub fn stop(&mut self) {
        if self.phase == Phase::Stopped {
            return;
        }

        let current = thread::current().id();
        assert!(
            self.handles
                .iter()
                .all(|handle| handle.thread().id() != current),
            "ThreadPool::stop called from one of its workers"
        );

        self.phase = Phase::Stopped;
        drop(self.shared.close());

        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!(pool = %self.thread_name, "pool worker panicked");
            }
        }

        self.shared.clear_claims();
        tracing::debug!(pool = %self.thread_name, "thread pool stopped");
    }

    /// Returns `true` between a successful [`start`](Self::start) and
    /// [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Returns the unsequenced runner of the pool.
    ///
    /// Tasks posted through it run on any worker, possibly at the same time
    /// as each other.
    pub fn get_task_runner(&self) -> Arc<dyn TaskRunner> {
        self.parallel.clone()
    }

    /// Creates a runner backed by a new virtual sequence.
    ///
    /// Its tasks run one at a time, in post order, on whichever worker is
    /// free. The sequence retires once the runner is dropped and its queue
    /// is empty.
    pub fn create_sequenced_task_runner(&self) -> Arc<dyn SequencedTaskRunner> {
        Arc::new(PooledSequencedTaskRunner::new(self.shared.clone()))
    }

    /// Creates a runner pinned to one worker thread.
    ///
    /// Workers are assigned round-robin. The runner shares the sequence of
    /// its worker with every other runner pinned to the same worker.
    pub fn create_single_thread_task_runner(&self) -> Arc<dyn SingleThreadTaskRunner> {
        Arc::new(PinnedTaskRunner::new(self.shared.clone()))
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool")
            .field("thread_name", &self.thread_name)
            .field("workers", &self.worker_count())
            .field("phase", &self.phase)
            .finish()
    }
}
