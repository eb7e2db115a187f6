use super::context::run_task;
use super::observer::{TaskObserver, TracingObserver};
use super::queue::TaskQueue;
use super::task::Location;
use super::task_runner::{SequencedTaskRunner, SingleThreadTaskRunner, TaskRunner};
use crate::callback::{OnceClosure, bind_once};
use crate::error::{Error, Result};
use crate::sequence::{self, SequenceId};
use crate::sync::{ScopedSignaller, WaitableEvent};

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const DEFAULT_THREAD_NAME: &str = "taskline-worker";

/// A dedicated OS thread running a task loop.
///
/// `WorkerThread` owns one physical thread and one sequence. Every task
/// posted through its [`task_runner`](Self::task_runner) runs on that
/// thread, one at a time, in `(run_at, post order)` order.
///
/// Lifecycle:
/// - [`start`](Self::start) spawns the thread with a fresh sequence,
/// - [`stop`](Self::stop) lets the running task finish, discards every
///   queued task without running it and joins the thread,
/// - dropping the worker stops it.
///
/// A stopped worker may be started again; it then gets a new sequence and a
/// new task runner.
///
/// # Examples
///
/// ```rust,ignore
/// let mut worker = WorkerThread::new();
/// worker.start()?;
///
/// let runner = worker.task_runner().unwrap();
/// runner.post_task(from_here!(), bind_once(|| println!("on worker"), ()));
///
/// worker.flush_for_testing();
/// worker.stop();
/// ```
pub struct WorkerThread {
    /// Name given to the OS thread.
    name: String,

    /// Notified around every task.
    observer: Arc<dyn TaskObserver>,

    /// Present while the thread is running.
    running: Option<Running>,
}

struct Running {
    runner: Arc<ThreadTaskRunner>,
    handle: JoinHandle<()>,
}

impl WorkerThread {
    /// Creates a stopped worker with the default configuration.
    pub fn new() -> Self {
        WorkerThreadBuilder::new().build()
    }

    /// Returns a builder to configure a worker before creating it.
    pub fn builder() -> WorkerThreadBuilder {
        WorkerThreadBuilder::new()
    }

    /// Spawns the OS thread and starts running tasks.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if the worker is already started,
    /// - [`Error::Spawn`] if the OS refused to create the thread.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Err(Error::AlreadyRunning(self.name.clone()));
        }

        let runner = Arc::new(ThreadTaskRunner::new(SequenceId::next()));
        let queue = runner.queue.clone();
        let observer = self.observer.clone();

        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || {
                while let Some(task) = queue.next_task() {
                    run_task(task, observer.as_ref());
                }
            })
            .map_err(|source| Error::Spawn {
                name: self.name.clone(),
                source,
            })?;

        tracing::debug!(thread = %self.name, sequence = %runner.sequence, "worker thread started");

        self.running = Some(Running { runner, handle });
        Ok(())
    }

    /// Stops the worker and joins its thread.
    ///
    /// The task currently running, if any, runs to completion. Every task
    /// still queued is dropped without running, and every later post is
    /// rejected. Calling `stop` on a stopped worker does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called from a task running on this worker.
    pub fn stop(&mut self) {
        let Some(Running { runner, handle }) = self.running.take() else {
            return;
        };

        assert_ne!(
            thread::current().id(),
            handle.thread().id(),
            "WorkerThread::stop called from its own thread"
        );

        let discarded = runner.queue.close();
        let count = discarded.len();
        drop(discarded);

        if handle.join().is_err() {
            tracing::warn!(thread = %self.name, "worker thread panicked");
        }

        tracing::debug!(thread = %self.name, discarded = count, "worker thread stopped");
    }

    /// Returns `true` between a successful [`start`](Self::start) and the
    /// next [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Returns the runner posting onto this worker, or `None` while it is
    /// stopped.
    ///
    /// The runner outlives the worker; once the worker stops, every post
    /// through it returns `false`.
    pub fn task_runner(&self) -> Option<Arc<dyn SingleThreadTaskRunner>> {
        self.running
            .as_ref()
            .map(|running| running.runner.clone() as Arc<dyn SingleThreadTaskRunner>)
    }

    /// Returns the sequence of the current run, or `None` while stopped.
    pub fn sequence_id(&self) -> Option<SequenceId> {
        self.running.as_ref().map(|running| running.runner.sequence)
    }

    /// Blocks until every task queued before this call, delayed ones
    /// included, has run.
    ///
    /// Returns immediately if the worker is stopped. If the worker is stopped
    /// concurrently, returns once the pending tasks have been discarded.
    ///
    /// # Panics
    ///
    /// Panics if called from a task running on this worker.
    pub fn flush_for_testing(&self) {
        let Some(running) = &self.running else {
            return;
        };

        assert_ne!(
            thread::current().id(),
            running.handle.thread().id(),
            "WorkerThread::flush_for_testing called from its own thread"
        );

        let event = Arc::new(WaitableEvent::new());
        let signaller = ScopedSignaller::new(&event);
        let barrier = bind_once(|_signaller: ScopedSignaller| {}, (signaller,));

        // A rejected barrier is dropped here, which signals the event.
        let _ = running.runner.queue.push_barrier(
            barrier,
            crate::from_here!(),
            running.runner.sequence,
        );

        event.wait();
    }
}

impl Default for WorkerThread {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerThread")
            .field("name", &self.name)
            .field("sequence", &self.sequence_id())
            .finish()
    }
}

/// Builder for configuring and creating a [`WorkerThread`].
///
/// # Examples
///
/// ```rust,ignore
/// let worker = WorkerThread::builder()
///     .name("io")
///     .observer(Arc::new(NoopObserver))
///     .build();
/// ```
pub struct WorkerThreadBuilder {
    name: String,
    observer: Arc<dyn TaskObserver>,
}

impl WorkerThreadBuilder {
    /// Creates a builder with the default thread name and a
    /// [`TracingObserver`].
    pub fn new() -> Self {
        Self {
            name: DEFAULT_THREAD_NAME.to_owned(),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Sets the name of the OS thread.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the observer notified around every task.
    pub fn observer(mut self, observer: Arc<dyn TaskObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Builds a stopped worker.
    pub fn build(self) -> WorkerThread {
        WorkerThread {
            name: self.name,
            observer: self.observer,
            running: None,
        }
    }
}

impl Default for WorkerThreadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Task runner posting onto a [`WorkerThread`] queue.
pub(crate) struct ThreadTaskRunner {
    queue: Arc<TaskQueue>,
    sequence: SequenceId,
}

impl ThreadTaskRunner {
    fn new(sequence: SequenceId) -> Self {
        Self {
            queue: Arc::new(TaskQueue::new()),
            sequence,
        }
    }
}

impl TaskRunner for ThreadTaskRunner {
    fn post_delayed_task(&self, location: Location, task: OnceClosure, delay: Duration) -> bool {
        self.queue
            .push(task, location, self.sequence, delay)
            .is_ok()
    }

    fn runs_tasks_in_current_sequence(&self) -> bool {
        sequence::runs_in_current_sequence(self.sequence)
    }
}

impl SequencedTaskRunner for ThreadTaskRunner {}

impl SingleThreadTaskRunner for ThreadTaskRunner {}
