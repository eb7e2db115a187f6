use super::state::{LaneId, Pick, Shared};
use crate::runtime::context::run_task;

use std::sync::Arc;
use std::time::Instant;

/// A worker thread of the pool.
///
/// A `Worker` repeatedly picks the earliest due task among:
/// 1. its own pinned queue,
/// 2. the unsequenced queue,
/// 3. every virtual sequence no other worker is serving.
///
/// It sleeps until the earliest deadline, or until a post or a released
/// claim wakes it, and exits once the pool stops accepting tasks.
pub(super) struct Worker {
    /// Index of the worker, also the index of its pinned queue.
    index: usize,

    shared: Arc<Shared>,
}

impl Worker {
    pub(super) fn new(index: usize, shared: Arc<Shared>) -> Self {
        Self { index, shared }
    }

    /// Runs the worker loop until the pool is stopped.
    pub(super) fn run(&self) {
        let shared = self.shared.as_ref();
        let mut state = shared.state.lock().unwrap();

        while state.is_accepting() {
            let now = Instant::now();

            state = match state.pick(self.index, now) {
                Pick::Run(lane) => {
                    let Some(task) = state.take(lane) else {
                        continue;
                    };
                    drop(state);

                    let claim = match lane {
                        LaneId::Sequence(key) => Some(SequenceClaim { shared, key }),
                        LaneId::Parallel | LaneId::Pinned(_) => None,
                    };
                    run_task(task, shared.observer.as_ref());
                    drop(claim);

                    shared.state.lock().unwrap()
                }
                Pick::Sleep(deadline) => {
                    shared
                        .condvar
                        .wait_timeout(state, deadline - now)
                        .unwrap()
                        .0
                }
                Pick::Idle => shared.condvar.wait(state).unwrap(),
            };
        }

        tracing::trace!(worker = self.index, "pool worker exiting");
    }
}

/// Exclusive right to run the next task of a virtual sequence.
///
/// Released on drop, including when the task panics.
struct SequenceClaim<'a> {
    shared: &'a Shared,
    key: usize,
}

impl Drop for SequenceClaim<'_> {
    fn drop(&mut self) {
        self.shared.release(self.key);
    }
}
