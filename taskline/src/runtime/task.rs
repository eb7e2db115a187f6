use crate::callback::OnceClosure;
use crate::sequence::SequenceId;

use std::cmp::Ordering;
use std::fmt;
use std::panic;
use std::time::Instant;

/// Where a task was posted from.
///
/// Produced by [`from_here!`](crate::from_here) and reported to
/// [`TaskObserver`](super::TaskObserver)s.
pub type Location = &'static panic::Location<'static>;

/// Ordering key of a task: earliest-run time first, insertion number as
/// tie-break.
pub(crate) type TaskKey = (Instant, u64);

/// A callback scheduled on a sequence.
pub(crate) struct Task {
    pub(crate) callback: OnceClosure,
    pub(crate) location: Location,
    pub(crate) sequence: SequenceId,

    /// Earliest time at which the task may run.
    pub(crate) run_at: Instant,

    /// Monotonically increasing insertion number.
    pub(crate) order: u64,
}

impl Task {
    pub(crate) fn key(&self) -> TaskKey {
        (self.run_at, self.order)
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            location: self.location,
            sequence: self.sequence,
            run_at: self.run_at,
            order: self.order,
        }
    }
}

impl Eq for Task {}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Ord for Task {
    /// Reversed so that a `BinaryHeap<Task>` pops the earliest task first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Description of a task handed to observers around its execution.
#[derive(Clone, Copy)]
pub struct TaskInfo {
    /// Where the task was posted from.
    pub location: Location,

    /// Sequence the task runs on.
    pub sequence: SequenceId,

    /// Earliest time the task was allowed to run.
    pub run_at: Instant,

    /// Insertion number within its queue.
    pub order: u64,
}

impl fmt::Debug for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskInfo")
            .field("location", &format_args!("{}", self.location))
            .field("sequence", &self.sequence)
            .field("order", &self.order)
            .finish()
    }
}
