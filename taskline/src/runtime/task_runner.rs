use super::task::Location;
use crate::callback::OnceClosure;

use std::time::Duration;

/// A destination for posted tasks.
///
/// Posting never blocks on the task itself: the callback is queued and runs
/// later on whichever thread the runner schedules it on. Runners are shared
/// as `Arc<dyn TaskRunner>` and may be used from any thread.
///
/// # Examples
///
/// ```rust,ignore
/// let runner = pool.get_task_runner();
/// runner.post_task(from_here!(), bind_once(|| println!("hello"), ()));
/// ```
pub trait TaskRunner: Send + Sync {
    /// Posts `task` to run no earlier than `delay` from now.
    ///
    /// The delay is a lower bound, not a precise schedule.
    ///
    /// # Returns
    ///
    /// `true` if the task was accepted, `false` if the runner is no longer
    /// accepting tasks. A rejected task is dropped without running.
    fn post_delayed_task(&self, location: Location, task: OnceClosure, delay: Duration) -> bool;

    /// Posts `task` to run as soon as possible.
    ///
    /// Equivalent to [`post_delayed_task`](Self::post_delayed_task) with a
    /// zero delay.
    fn post_task(&self, location: Location, task: OnceClosure) -> bool {
        self.post_delayed_task(location, task, Duration::ZERO)
    }

    /// Returns `true` if the calling thread is currently running a task on
    /// this runner's sequence.
    fn runs_tasks_in_current_sequence(&self) -> bool;
}

/// A [`TaskRunner`] whose tasks run one at a time, in post order.
///
/// Two tasks posted to the same sequenced runner never overlap, and
/// immediate tasks run in the order they were posted. Delayed tasks run in
/// order of their earliest-run time, ties broken by post order.
pub trait SequencedTaskRunner: TaskRunner {}

/// A [`SequencedTaskRunner`] whose tasks all run on one physical thread.
pub trait SingleThreadTaskRunner: SequencedTaskRunner {}
