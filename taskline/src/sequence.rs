//! Sequence identity.
//!
//! A *sequence* is a logical execution context in which tasks run one at a
//! time, in post order, regardless of which physical thread runs them.
//!
//! Two pieces of process-wide state live here and nowhere else:
//! - the counter handing out [`SequenceId`]s,
//! - the per-thread stack recording which sequence is currently running.
//!
//! Run loops push the id of the task's sequence before running it and pop
//! it afterwards, so code inside a task can ask "am I running on sequence
//! X?" through [`runs_in_current_sequence`].

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next id handed out by [`SequenceId::next`]. `0` is reserved for
/// "no sequence".
static NEXT_SEQUENCE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    /// Sequences currently executing on this thread, innermost last.
    static CURRENT_SEQUENCES: RefCell<Vec<SequenceId>> = const { RefCell::new(Vec::new()) };
}

/// Opaque identifier of a sequence.
///
/// Identifiers are strictly increasing and never reused within the
/// lifetime of the process.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(u64);

impl SequenceId {
    /// Allocates a fresh, process-unique sequence id.
    pub fn next() -> Self {
        Self(NEXT_SEQUENCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of the id.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub(crate) fn from_raw(raw: u64) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceId({})", self.0)
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq#{}", self.0)
    }
}

/// Marks `id` as the sequence running on the calling thread.
///
/// Pushes nest: the previous sequence becomes current again after the
/// matching [`pop_current`].
pub fn push_current(id: SequenceId) {
    CURRENT_SEQUENCES.with(|stack| stack.borrow_mut().push(id));
}

/// Removes the innermost sequence pushed by [`push_current`].
///
/// # Panics
///
/// Panics if no sequence is currently pushed on this thread.
pub fn pop_current() -> SequenceId {
    CURRENT_SEQUENCES.with(|stack| {
        stack
            .borrow_mut()
            .pop()
            .expect("pop_current called without a matching push_current")
    })
}

/// Returns the sequence currently running on the calling thread, if any.
pub fn current() -> Option<SequenceId> {
    CURRENT_SEQUENCES.with(|stack| stack.borrow().last().copied())
}

/// Returns `true` iff `id` is the innermost sequence of the calling thread.
pub fn runs_in_current_sequence(id: SequenceId) -> bool {
    current() == Some(id)
}

/// Guard that keeps a sequence pushed for its own lifetime.
///
/// Run loops wrap every task in one of these; tests use it to pretend they
/// run on some sequence.
///
/// # Examples
///
/// ```rust
/// use taskline::sequence::{self, ScopedSequence, SequenceId};
///
/// let id = SequenceId::next();
/// {
///     let _scope = ScopedSequence::enter(id);
///     assert!(sequence::runs_in_current_sequence(id));
/// }
/// assert!(!sequence::runs_in_current_sequence(id));
/// ```
#[must_use = "the sequence is popped as soon as the guard is dropped"]
pub struct ScopedSequence {
    id: SequenceId,
}

impl ScopedSequence {
    /// Pushes `id` and returns a guard that pops it on drop.
    pub fn enter(id: SequenceId) -> Self {
        push_current(id);
        Self { id }
    }

    /// Pushes a brand new sequence.
    pub fn fresh() -> Self {
        Self::enter(SequenceId::next())
    }

    pub fn id(&self) -> SequenceId {
        self.id
    }
}

impl Drop for ScopedSequence {
    fn drop(&mut self) {
        let popped = pop_current();
        debug_assert_eq!(popped, self.id, "sequence scopes must be properly nested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let a = SequenceId::next();
        let b = SequenceId::next();
        let c = SequenceId::next();

        assert!(a < b && b < c);
        assert_ne!(a.as_u64(), 0);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                std::thread::spawn(|| (0..250).map(|_| SequenceId::next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all: Vec<_> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();

        assert_eq!(all.len(), total);
    }

    #[test]
    fn nested_scopes_restore_outer_sequence() {
        assert_eq!(current(), None);

        let outer = ScopedSequence::fresh();
        let outer_id = outer.id();
        {
            let inner = ScopedSequence::fresh();
            assert!(runs_in_current_sequence(inner.id()));
            assert!(!runs_in_current_sequence(outer_id));
        }
        assert!(runs_in_current_sequence(outer_id));

        drop(outer);
        assert_eq!(current(), None);
    }

    #[test]
    fn zero_is_not_a_sequence() {
        assert_eq!(SequenceId::from_raw(0), None);
        let id = SequenceId::next();
        assert_eq!(SequenceId::from_raw(id.as_u64()), Some(id));
    }
}
