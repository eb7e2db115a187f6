use super::observer::TaskObserver;
use super::task::Task;
use crate::sequence::ScopedSequence;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Runs `task` inside its sequence context.
///
/// The task's sequence is installed as the current sequence of the calling
/// thread for the duration of the callback, so that
/// [`runs_tasks_in_current_sequence`](super::TaskRunner::runs_tasks_in_current_sequence)
/// and weak pointer checks see it. The previous context is restored
/// afterwards.
///
/// A panicking callback is caught and logged, so the run loop calling this
/// keeps serving its queue.
///
/// # Arguments
///
/// * `task` - The task to execute. It is consumed.
/// * `observer` - Notified before and after the callback runs.
pub(crate) fn run_task(task: Task, observer: &dyn TaskObserver) {
    let info = task.info();
    let _scope = ScopedSequence::enter(task.sequence);

    observer.will_run_task(&info);
    let started = Instant::now();

    let callback = task.callback;
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || callback.run(()))) {
        tracing::error!(
            location = %info.location,
            sequence = %info.sequence,
            panic = panic_message(payload.as_ref()),
            "task panicked"
        );
    }

    observer.did_run_task(&info, started.elapsed());
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "<non-string panic payload>"
    }
}
