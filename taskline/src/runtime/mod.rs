//! Task runners, run loops and the threads that drive them.
//!
//! This module contains the scheduling side of the crate:
//! - the [`TaskRunner`] family of traits tasks are posted through,
//! - [`WorkerThread`], one OS thread running one sequence,
//! - [`ThreadPool`], N workers serving unsequenced, sequenced and pinned
//!   runners,
//! - the [`TaskObserver`] hook reported to around every task.
//!
//! Tasks are [`OnceClosure`](crate::callback::OnceClosure)s tagged with the
//! [`Location`] they were posted from, usually produced by
//! [`from_here!`](crate::from_here).

mod builder;
mod context;
mod observer;
mod pool;
mod queue;
mod task;
mod task_runner;
mod thread;

pub use builder::ThreadPoolBuilder;
pub use observer::{NoopObserver, TaskObserver, TracingObserver};
pub use pool::ThreadPool;
pub use task::{Location, TaskInfo};
pub use task_runner::{SequencedTaskRunner, SingleThreadTaskRunner, TaskRunner};
pub use thread::{WorkerThread, WorkerThreadBuilder};
