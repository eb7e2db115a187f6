//! Weak pointers with explicit invalidation.
//!
//! A [`WeakPtrFactory`] usually lives inside the object it hands out
//! pointers to, built with [`Arc::new_cyclic`]. Every [`WeakPtr`] it creates
//! shares one control block with the factory. Invalidating the factory, or
//! dropping it together with its owner, turns every pointer into a
//! permanent no-op.
//!
//! Pointers never keep their target alive. Dereferencing goes through
//! [`WeakPtr::with`], which checks the control block on every use.
//!
//! In debug builds the control block also remembers the sequence it belongs
//! to. A factory created outside of any sequence binds to the first
//! sequence that dereferences one of its pointers.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskline::weak::{WeakPtr, WeakPtrFactory};
//!
//! struct Counter {
//!     hits: AtomicUsize,
//!     weak_factory: WeakPtrFactory<Counter>,
//! }
//!
//! let counter = Arc::new_cyclic(|me| Counter {
//!     hits: AtomicUsize::new(0),
//!     weak_factory: WeakPtrFactory::new(me),
//! });
//!
//! let weak: WeakPtr<Counter> = counter.weak_factory.get_weak_ptr();
//! weak.with(|c| c.hits.fetch_add(1, Ordering::SeqCst));
//!
//! counter.weak_factory.invalidate_weak_ptrs();
//! assert!(weak.with(|c| c.hits.fetch_add(1, Ordering::SeqCst)).is_none());
//! assert_eq!(counter.hits.load(Ordering::SeqCst), 1);
//! ```

use crate::sequence::{self, SequenceId};

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Control block shared by a factory and all of its pointers.
struct Flag {
    valid: AtomicBool,

    /// Raw id of the owning sequence, `0` while detached.
    owner: AtomicU64,
}

impl Flag {
    fn new() -> Self {
        let owner = sequence::current().map_or(0, SequenceId::as_u64);

        Self {
            valid: AtomicBool::new(true),
            owner: AtomicU64::new(owner),
        }
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }

    /// Binds a detached block to the calling sequence and asserts that
    /// bound blocks are only used on their owning sequence.
    #[cfg(debug_assertions)]
    fn check_sequence(&self) {
        let Some(current) = sequence::current() else {
            return;
        };

        if let Err(owner) = self.owner.compare_exchange(
            0,
            current.as_u64(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            debug_assert_eq!(
                SequenceId::from_raw(owner),
                Some(current),
                "weak pointer used outside of its owning sequence"
            );
        }
    }

    #[cfg(not(debug_assertions))]
    fn check_sequence(&self) {}
}

/// Hands out [`WeakPtr`]s to a single target and controls their validity.
pub struct WeakPtrFactory<T> {
    target: Weak<T>,
    flag: Arc<Flag>,
}

impl<T> WeakPtrFactory<T> {
    /// Creates a factory for `target`, bound to the calling sequence.
    pub fn new(target: &Weak<T>) -> Self {
        Self {
            target: target.clone(),
            flag: Arc::new(Flag::new()),
        }
    }

    /// Returns a new pointer sharing this factory's control block.
    pub fn get_weak_ptr(&self) -> WeakPtr<T> {
        WeakPtr {
            target: self.target.clone(),
            flag: Some(self.flag.clone()),
        }
    }

    /// Invalidates every pointer handed out by this factory, including the
    /// ones it will hand out later. Invalidation is permanent.
    pub fn invalidate_weak_ptrs(&self) {
        self.flag.check_sequence();
        self.flag.invalidate();
    }

    /// Returns `true` while at least one pointer from this factory exists.
    pub fn has_weak_ptrs(&self) -> bool {
        Arc::strong_count(&self.flag) > 1
    }
}

impl<T> Drop for WeakPtrFactory<T> {
    fn drop(&mut self) {
        self.flag.invalidate();
    }
}

impl<T> fmt::Debug for WeakPtrFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtrFactory")
            .field("valid", &self.flag.is_valid())
            .finish()
    }
}

/// Non-owning, invalidation-aware pointer to a `T`.
///
/// A default-constructed pointer is permanently invalid; every operation on
/// it is a no-op.
pub struct WeakPtr<T> {
    target: Weak<T>,
    flag: Option<Arc<Flag>>,
}

impl<T> WeakPtr<T> {
    /// Creates an empty, permanently invalid pointer.
    pub fn new() -> Self {
        Self {
            target: Weak::new(),
            flag: None,
        }
    }

    /// Returns `true` if the factory has not been invalidated and the
    /// target is still alive.
    pub fn is_valid(&self) -> bool {
        self.flag.as_ref().is_some_and(|flag| flag.is_valid()) && self.target.strong_count() > 0
    }

    /// Runs `f` on the target if the pointer is still valid.
    ///
    /// Returns `None` without touching the target otherwise.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let flag = self.flag.as_ref()?;

        if !flag.is_valid() {
            return None;
        }

        flag.check_sequence();

        let target = self.target.upgrade()?;
        Some(f(&target))
    }
}

impl<T> Clone for WeakPtr<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            flag: self.flag.clone(),
        }
    }
}

impl<T> Default for WeakPtr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for WeakPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtr")
            .field("valid", &self.is_valid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::ScopedSequence;

    use std::sync::atomic::AtomicUsize;

    struct Target {
        value: AtomicUsize,
        weak_factory: WeakPtrFactory<Target>,
    }

    impl Target {
        fn new() -> Arc<Self> {
            Arc::new_cyclic(|me| Target {
                value: AtomicUsize::new(0),
                weak_factory: WeakPtrFactory::new(me),
            })
        }

        fn bump(&self) -> usize {
            self.value.fetch_add(1, Ordering::SeqCst) + 1
        }
    }

    #[test]
    fn empty_pointer_is_invalid() {
        let weak = WeakPtr::<Target>::default();

        assert!(!weak.is_valid());
        assert_eq!(weak.with(Target::bump), None);
    }

    #[test]
    fn valid_pointer_reaches_target() {
        let target = Target::new();
        let weak = target.weak_factory.get_weak_ptr();

        assert!(weak.is_valid());
        assert_eq!(weak.with(Target::bump), Some(1));
        assert_eq!(weak.clone().with(Target::bump), Some(2));
    }

    #[test]
    fn invalidation_reaches_existing_and_copied_pointers() {
        let target = Target::new();
        let weak = target.weak_factory.get_weak_ptr();
        let copy = weak.clone();

        target.weak_factory.invalidate_weak_ptrs();

        for _ in 0..3 {
            assert_eq!(weak.with(Target::bump), None);
            assert_eq!(copy.clone().with(Target::bump), None);
        }
        assert!(!target.weak_factory.get_weak_ptr().is_valid());
        assert_eq!(target.value.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_the_owner_invalidates() {
        let target = Target::new();
        let weak = target.weak_factory.get_weak_ptr();

        drop(target);

        assert!(!weak.is_valid());
        assert_eq!(weak.with(Target::bump), None);
    }

    #[test]
    fn factory_tracks_outstanding_pointers() {
        let target = Target::new();
        assert!(!target.weak_factory.has_weak_ptrs());

        let weak = target.weak_factory.get_weak_ptr();
        assert!(target.weak_factory.has_weak_ptrs());

        drop(weak);
        assert!(!target.weak_factory.has_weak_ptrs());
    }

    #[test]
    fn detached_factory_binds_on_first_use() {
        let target = Target::new();
        let weak = target.weak_factory.get_weak_ptr();

        let scope = ScopedSequence::fresh();
        assert_eq!(weak.with(Target::bump), Some(1));
        assert_eq!(
            target.weak_factory.flag.owner.load(Ordering::Acquire),
            if cfg!(debug_assertions) {
                scope.id().as_u64()
            } else {
                0
            }
        );
    }

    #[test]
    fn validity_is_visible_across_threads() {
        let target = Target::new();
        let weak = target.weak_factory.get_weak_ptr();

        target.weak_factory.invalidate_weak_ptrs();

        let seen = std::thread::spawn(move || weak.with(Target::bump))
            .join()
            .unwrap();
        assert_eq!(seen, None);
    }
}
