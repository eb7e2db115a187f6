//! Hooks around task execution.
//!
//! Every run loop reports each task it runs to a [`TaskObserver`]:
//! - [`TaskObserver::will_run_task`] right before the callback runs,
//! - [`TaskObserver::did_run_task`] right after it returns.
//!
//! Provided implementations:
//! - [`TracingObserver`] (default) emits `trace`-level events under the
//!   `taskline::task` target,
//! - [`NoopObserver`] does nothing.
//!
//! # Example: counting tasks
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskline::runtime::{TaskInfo, TaskObserver};
//!
//! #[derive(Default)]
//! struct Counter(AtomicUsize);
//!
//! impl TaskObserver for Counter {
//!     fn will_run_task(&self, _task: &TaskInfo) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```

use super::task::TaskInfo;

use std::time::Duration;

/// Receives a notification around every task a run loop executes.
///
/// Hooks are called on the thread running the task, inside the task's
/// sequence, and must not block.
pub trait TaskObserver: Send + Sync {
    /// Called right before `task` runs.
    fn will_run_task(&self, _task: &TaskInfo) {}

    /// Called right after `task` returned, with its wall-clock run time.
    fn did_run_task(&self, _task: &TaskInfo, _elapsed: Duration) {}
}

/// Observer that ignores every task.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl TaskObserver for NoopObserver {}

/// Observer that records every task as a `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TaskObserver for TracingObserver {
    fn will_run_task(&self, task: &TaskInfo) {
        tracing::trace!(
            target: "taskline::task",
            location = %task.location,
            sequence = %task.sequence,
            order = task.order,
            "running task"
        );
    }

    fn did_run_task(&self, task: &TaskInfo, elapsed: Duration) {
        tracing::trace!(
            target: "taskline::task",
            location = %task.location,
            sequence = %task.sequence,
            elapsed_us = elapsed.as_micros() as u64,
            "task finished"
        );
    }
}
