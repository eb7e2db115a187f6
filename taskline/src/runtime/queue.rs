use super::task::{Location, Task};
use crate::callback::OnceClosure;
use crate::sequence::SequenceId;
use crate::utils::deadline_after;

use std::collections::BinaryHeap;
use std::mem;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Pending tasks of a single-consumer sequence.
///
/// Any thread may push; only the owning run loop pops. Tasks come out in
/// `(run_at, order)` order, and a pop blocks until the earliest task is due,
/// a new task is pushed or the queue is closed.
pub(crate) struct TaskQueue {
    state: Mutex<QueueState>,
    condvar: Condvar,
}

struct QueueState {
    tasks: BinaryHeap<Task>,
    next_order: u64,
    accepting: bool,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: BinaryHeap::new(),
                next_order: 0,
                accepting: true,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Enqueues `callback` to run no earlier than `delay` from now.
    ///
    /// Returns the callback back if the queue is closed. The caller drops
    /// it, outside of the queue lock.
    pub(crate) fn push(
        &self,
        callback: OnceClosure,
        location: Location,
        sequence: SequenceId,
        delay: Duration,
    ) -> Result<(), OnceClosure> {
        let run_at = deadline_after(Instant::now(), delay);
        self.push_at(callback, location, sequence, |_| run_at)
    }

    /// Enqueues `callback` behind every task already queued, delayed ones
    /// included.
    pub(crate) fn push_barrier(
        &self,
        callback: OnceClosure,
        location: Location,
        sequence: SequenceId,
    ) -> Result<(), OnceClosure> {
        let now = Instant::now();
        self.push_at(callback, location, sequence, |tasks| {
            tasks.iter().map(|task| task.run_at).fold(now, Instant::max)
        })
    }

    fn push_at(
        &self,
        callback: OnceClosure,
        location: Location,
        sequence: SequenceId,
        run_at: impl FnOnce(&BinaryHeap<Task>) -> Instant,
    ) -> Result<(), OnceClosure> {
        let mut state = self.state.lock().unwrap();

        if !state.accepting {
            return Err(callback);
        }

        let order = state.next_order;
        state.next_order += 1;

        let run_at = run_at(&state.tasks);
        state.tasks.push(Task {
            callback,
            location,
            sequence,
            run_at,
            order,
        });

        drop(state);
        self.condvar.notify_one();

        Ok(())
    }

    /// Blocks until the earliest task is due and returns it.
    ///
    /// Returns `None` once the queue has been closed.
    pub(crate) fn next_task(&self) -> Option<Task> {
        let mut state = self.state.lock().unwrap();

        loop {
            if !state.accepting {
                return None;
            }

            let now = Instant::now();
            state = match state.tasks.peek().map(|task| task.run_at) {
                Some(run_at) if run_at <= now => return state.tasks.pop(),
                Some(run_at) => self.condvar.wait_timeout(state, run_at - now).unwrap().0,
                None => self.condvar.wait(state).unwrap(),
            };
        }
    }

    /// Stops accepting tasks and wakes the run loop.
    ///
    /// Returns the tasks that will never run so the caller can drop them
    /// without holding the lock.
    pub(crate) fn close(&self) -> Vec<Task> {
        let mut state = self.state.lock().unwrap();
        state.accepting = false;
        let discarded = mem::take(&mut state.tasks).into_vec();

        drop(state);
        self.condvar.notify_all();

        discarded
    }

    #[cfg(test)]
    fn is_accepting(&self) -> bool {
        self.state.lock().unwrap().accepting
    }
}
