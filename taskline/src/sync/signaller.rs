use super::WaitableEvent;

use std::fmt;
use std::sync::Arc;

/// Signals a [`WaitableEvent`] exactly once, when dropped.
///
/// The signaller is move-only: moving it hands the obligation to the new
/// owner and the old binding is gone, so a chain of moves still fires the
/// event exactly once. It is typically bound into the last callback of a
/// chain of tasks so that whoever waits on the event learns when the chain
/// is done, including when the task holding it is discarded unrun.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use taskline::sync::{ScopedSignaller, WaitableEvent};
///
/// let event = Arc::new(WaitableEvent::new());
/// let signaller = ScopedSignaller::new(&event);
/// let moved = signaller;
///
/// assert!(!event.is_signaled());
/// drop(moved);
/// assert!(event.is_signaled());
/// ```
#[derive(Default)]
pub struct ScopedSignaller {
    event: Option<Arc<WaitableEvent>>,
}

impl ScopedSignaller {
    /// Creates a signaller that owes one signal to `event`.
    pub fn new(event: &Arc<WaitableEvent>) -> Self {
        Self {
            event: Some(event.clone()),
        }
    }

    /// Returns `true` while the signaller still owes a signal.
    pub fn is_armed(&self) -> bool {
        self.event.is_some()
    }
}

impl Drop for ScopedSignaller {
    fn drop(&mut self) {
        if let Some(event) = self.event.take() {
            event.signal();
        }
    }
}

impl fmt::Debug for ScopedSignaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedSignaller")
            .field("armed", &self.is_armed())
            .finish()
    }
}
