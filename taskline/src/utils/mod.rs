//! Internal helpers.
//!
//! - [`Slab`]: indexed slots the thread pool keeps its virtual sequences in,
//!   reused once a sequence retires,
//! - [`deadline_after`]: overflow-free deadline arithmetic.

mod slab;

pub(crate) use slab::Slab;

use std::time::{Duration, Instant};

/// Stand-in for "never" when a delay does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 100);

/// Returns `now + delay`, saturating to a far-future instant instead of
/// panicking on overflow.
pub(crate) fn deadline_after(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
