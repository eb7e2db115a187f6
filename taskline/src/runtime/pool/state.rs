use crate::callback::OnceClosure;
use crate::runtime::observer::TaskObserver;
use crate::runtime::task::{Location, Task, TaskKey};
use crate::sequence::SequenceId;
use crate::utils::{Slab, deadline_after};

use std::collections::BinaryHeap;
use std::mem;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Identifies one queue of the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum LaneId {
    /// The unsequenced queue, served by every worker.
    Parallel,

    /// The queue pinned to the worker at this index.
    Pinned(usize),

    /// The virtual sequence stored at this slab key.
    Sequence(usize),
}

/// What a worker should do next.
pub(super) enum Pick {
    /// Run the earliest due task of this lane.
    Run(LaneId),

    /// Nothing is due before this instant.
    Sleep(Instant),

    /// Nothing is queued for this worker.
    Idle,
}

/// Pending tasks of one sequence.
struct Lane {
    sequence: SequenceId,
    tasks: BinaryHeap<Task>,
}

impl Lane {
    fn new(sequence: SequenceId) -> Self {
        Self {
            sequence,
            tasks: BinaryHeap::new(),
        }
    }

    fn head(&self) -> Option<TaskKey> {
        self.tasks.peek().map(Task::key)
    }
}

/// A virtual sequence: a queue only one worker at a time may serve.
struct SequenceSlot {
    lane: Lane,

    /// A worker is running a task of this sequence.
    claimed: bool,

    /// The runner is gone; the slot retires once empty and unclaimed.
    orphaned: bool,
}

/// Everything the pool mutates, guarded by one mutex.
pub(super) struct PoolState {
    accepting: bool,

    /// Pool-wide insertion counter, shared by every lane.
    next_order: u64,

    parallel: Lane,
    pinned: Vec<Lane>,
    sequences: Slab<SequenceSlot>,

    /// Worker the next single-thread runner is pinned to.
    next_pinned: usize,
}

impl PoolState {
    fn new(worker_count: usize) -> Self {
        Self {
            accepting: true,
            next_order: 0,
            parallel: Lane::new(SequenceId::next()),
            pinned: (0..worker_count)
                .map(|_| Lane::new(SequenceId::next()))
                .collect(),
            sequences: Slab::with_capacity(worker_count),
            next_pinned: 0,
        }
    }

    pub(super) fn is_accepting(&self) -> bool {
        self.accepting
    }

    fn lane_mut(&mut self, id: LaneId) -> Option<&mut Lane> {
        match id {
            LaneId::Parallel => Some(&mut self.parallel),
            LaneId::Pinned(worker) => self.pinned.get_mut(worker),
            LaneId::Sequence(key) => self.sequences.get_mut(key).map(|slot| &mut slot.lane),
        }
    }

    fn push(
        &mut self,
        id: LaneId,
        callback: OnceClosure,
        location: Location,
        delay: Duration,
    ) -> Result<(), OnceClosure> {
        if !self.accepting {
            return Err(callback);
        }

        let order = self.next_order;
        let Some(lane) = self.lane_mut(id) else {
            return Err(callback);
        };

        lane.tasks.push(Task {
            callback,
            location,
            sequence: lane.sequence,
            run_at: deadline_after(Instant::now(), delay),
            order,
        });

        self.next_order += 1;
        Ok(())
    }

    /// Finds the earliest task `worker` may run: its pinned queue, the
    /// unsequenced queue and every unclaimed sequence compete on
    /// `(run_at, order)`.
    pub(super) fn pick(&self, worker: usize, now: Instant) -> Pick {
        let pinned = self
            .pinned
            .get(worker)
            .map(|lane| (LaneId::Pinned(worker), lane));
        let parallel = Some((LaneId::Parallel, &self.parallel));
        let sequences = self
            .sequences
            .iter()
            .filter(|(_, slot)| !slot.claimed)
            .map(|(key, slot)| (LaneId::Sequence(key), &slot.lane));

        let earliest = pinned
            .into_iter()
            .chain(parallel)
            .chain(sequences)
            .filter_map(|(id, lane)| lane.head().map(|key| (key, id)))
            .min_by_key(|(key, _)| *key);

        match earliest {
            Some(((run_at, _), id)) if run_at <= now => Pick::Run(id),
            Some(((run_at, _), _)) => Pick::Sleep(run_at),
            None => Pick::Idle,
        }
    }

    /// Pops the head of `id`, claiming the sequence if it is virtual.
    pub(super) fn take(&mut self, id: LaneId) -> Option<Task> {
        let task = self.lane_mut(id)?.tasks.pop()?;

        if let LaneId::Sequence(key) = id {
            if let Some(slot) = self.sequences.get_mut(key) {
                slot.claimed = true;
            }
        }

        Some(task)
    }

    /// Releases the claim on the sequence at `key`.
    ///
    /// Returns `true` if the sequence still has queued tasks.
    fn release(&mut self, key: usize) -> bool {
        let Some(slot) = self.sequences.get_mut(key) else {
            return false;
        };

        slot.claimed = false;
        let pending = !slot.lane.tasks.is_empty();

        if slot.orphaned && !pending {
            self.sequences.remove(key);
        }

        pending
    }

    fn new_sequence(&mut self) -> (usize, SequenceId) {
        let sequence = SequenceId::next();
        let key = self.sequences.insert(SequenceSlot {
            lane: Lane::new(sequence),
            claimed: false,
            orphaned: false,
        });

        (key, sequence)
    }

    fn retire_sequence(&mut self, key: usize) {
        let Some(slot) = self.sequences.get_mut(key) else {
            return;
        };

        if slot.claimed || !slot.lane.tasks.is_empty() {
            slot.orphaned = true;
        } else {
            self.sequences.remove(key);
        }
    }

    fn next_pinned_worker(&mut self) -> (usize, SequenceId) {
        let worker = self.next_pinned;
        self.next_pinned = (self.next_pinned + 1) % self.pinned.len();

        (worker, self.pinned[worker].sequence)
    }

    /// Stops accepting tasks and empties every queue.
    fn close(&mut self) -> Vec<Task> {
        self.accepting = false;

        let mut discarded = mem::take(&mut self.parallel.tasks).into_vec();
        for lane in &mut self.pinned {
            discarded.extend(mem::take(&mut lane.tasks).into_vec());
        }
        for (_, slot) in self.sequences.iter_mut() {
            discarded.extend(mem::take(&mut slot.lane.tasks).into_vec());
        }

        let retired: Vec<_> = self
            .sequences
            .iter()
            .filter(|(_, slot)| slot.orphaned && !slot.claimed)
            .map(|(key, _)| key)
            .collect();
        for key in retired {
            self.sequences.remove(key);
        }

        discarded
    }

    fn clear_claims(&mut self) {
        for (_, slot) in self.sequences.iter_mut() {
            slot.claimed = false;
        }
    }
}

/// State shared by the pool, its workers and its runners.
///
/// Tasks are never dropped while `state` is locked: a task may own a runner
/// whose drop locks `state` again.
pub(crate) struct Shared {
    pub(super) state: Mutex<PoolState>,
    pub(super) condvar: Condvar,
    pub(super) observer: Arc<dyn TaskObserver>,
    pub(super) worker_count: usize,
}

impl Shared {
    pub(super) fn new(worker_count: usize, observer: Arc<dyn TaskObserver>) -> Self {
        Self {
            state: Mutex::new(PoolState::new(worker_count)),
            condvar: Condvar::new(),
            observer,
            worker_count,
        }
    }

    /// Queues `callback` on lane `id` and wakes the workers.
    ///
    /// Returns `false` if the pool stopped; the callback is then dropped
    /// after the lock is released.
    pub(super) fn post(
        &self,
        id: LaneId,
        location: Location,
        callback: OnceClosure,
        delay: Duration,
    ) -> bool {
        let pushed = self
            .state
            .lock()
            .unwrap()
            .push(id, callback, location, delay);

        match pushed {
            Ok(()) => {
                // A pinned task can only be served by one worker, so wake all.
                self.condvar.notify_all();
                true
            }
            Err(rejected) => {
                drop(rejected);
                false
            }
        }
    }

    /// Releases a claim. Called from a guard, possibly while unwinding.
    pub(super) fn release(&self, key: usize) {
        let pending = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .release(key);

        if pending {
            self.condvar.notify_all();
        }
    }

    pub(super) fn parallel_sequence(&self) -> SequenceId {
        self.state.lock().unwrap().parallel.sequence
    }

    pub(super) fn new_sequence(&self) -> (usize, SequenceId) {
        self.state.lock().unwrap().new_sequence()
    }

    pub(super) fn retire_sequence(&self, key: usize) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retire_sequence(key);
    }

    pub(super) fn next_pinned_worker(&self) -> (usize, SequenceId) {
        self.state.lock().unwrap().next_pinned_worker()
    }

    /// Stops accepting tasks, wakes every worker and returns the tasks that
    /// will never run.
    pub(super) fn close(&self) -> Vec<Task> {
        let mut state = self.state.lock().unwrap();
        let discarded = state.close();
        let sequences = state.sequences.len();
        drop(state);

        self.condvar.notify_all();
        tracing::debug!(discarded = discarded.len(), sequences, "thread pool closed");

        discarded
    }

    pub(super) fn clear_claims(&self) {
        self.state.lock().unwrap().clear_claims();
    }
}
