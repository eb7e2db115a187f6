use super::state::{LaneId, Shared};
use crate::callback::OnceClosure;
use crate::runtime::task::Location;
use crate::runtime::task_runner::{SequencedTaskRunner, SingleThreadTaskRunner, TaskRunner};
use crate::sequence::{self, SequenceId};

use std::sync::Arc;
use std::time::Duration;

/// Posts onto the unsequenced queue: tasks run on any worker and may
/// overlap.
pub(crate) struct ParallelTaskRunner {
    shared: Arc<Shared>,
    sequence: SequenceId,
}

impl ParallelTaskRunner {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        let sequence = shared.parallel_sequence();
        Self { shared, sequence }
    }
}

impl TaskRunner for ParallelTaskRunner {
    fn post_delayed_task(&self, location: Location, task: OnceClosure, delay: Duration) -> bool {
        self.shared.post(LaneId::Parallel, location, task, delay)
    }

    fn runs_tasks_in_current_sequence(&self) -> bool {
        sequence::runs_in_current_sequence(self.sequence)
    }
}

/// Posts onto a virtual sequence: tasks run in post order, one at a time,
/// on whichever worker claims the sequence.
pub(crate) struct PooledSequencedTaskRunner {
    shared: Arc<Shared>,
    key: usize,
    sequence: SequenceId,
}

impl PooledSequencedTaskRunner {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        let (key, sequence) = shared.new_sequence();
        Self {
            shared,
            key,
            sequence,
        }
    }
}

impl TaskRunner for PooledSequencedTaskRunner {
    fn post_delayed_task(&self, location: Location, task: OnceClosure, delay: Duration) -> bool {
        self.shared
            .post(LaneId::Sequence(self.key), location, task, delay)
    }

    fn runs_tasks_in_current_sequence(&self) -> bool {
        sequence::runs_in_current_sequence(self.sequence)
    }
}

impl SequencedTaskRunner for PooledSequencedTaskRunner {}

impl Drop for PooledSequencedTaskRunner {
    fn drop(&mut self) {
        self.shared.retire_sequence(self.key);
    }
}

/// Posts onto the queue of one worker: tasks always run on that physical
/// thread, in the worker's sequence.
pub(crate) struct PinnedTaskRunner {
    shared: Arc<Shared>,
    worker: usize,
    sequence: SequenceId,
}

impl PinnedTaskRunner {
    pub(super) fn new(shared: Arc<Shared>) -> Self {
        let (worker, sequence) = shared.next_pinned_worker();
        Self {
            shared,
            worker,
            sequence,
        }
    }
}

impl TaskRunner for PinnedTaskRunner {
    fn post_delayed_task(&self, location: Location, task: OnceClosure, delay: Duration) -> bool {
        self.shared
            .post(LaneId::Pinned(self.worker), location, task, delay)
    }

    fn runs_tasks_in_current_sequence(&self) -> bool {
        sequence::runs_in_current_sequence(self.sequence)
    }
}

impl SequencedTaskRunner for PinnedTaskRunner {}

impl SingleThreadTaskRunner for PinnedTaskRunner {}
