use crate::utils::deadline_after;

use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A one-shot, manual-reset signal shared between threads.
///
/// The event starts unsignaled and becomes signaled exactly once; it never
/// resets. Any number of threads may block in [`wait`](Self::wait) until
/// then.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use taskline::sync::WaitableEvent;
///
/// let event = Arc::new(WaitableEvent::new());
/// let signaller = event.clone();
///
/// std::thread::spawn(move || signaller.signal());
/// event.wait();
/// assert!(event.is_signaled());
/// ```
#[derive(Debug, Default)]
pub struct WaitableEvent {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl WaitableEvent {
    /// Creates an unsignaled event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals the event and wakes every waiter.
    ///
    /// Signaling an already signaled event has no further effect.
    pub fn signal(&self) {
        let mut signaled = self.signaled.lock().unwrap();
        if !*signaled {
            *signaled = true;
            self.condvar.notify_all();
        }
    }

    /// Returns `true` once the event has been signaled.
    pub fn is_signaled(&self) -> bool {
        *self.signaled.lock().unwrap()
    }

    /// Blocks the calling thread until the event is signaled.
    ///
    /// Returns immediately if it already is.
    pub fn wait(&self) {
        let signaled = self.signaled.lock().unwrap();
        let _signaled = self
            .condvar
            .wait_while(signaled, |signaled| !*signaled)
            .unwrap();
    }

    /// Blocks until the event is signaled or `timeout` elapses.
    ///
    /// Returns `true` if the event was signaled.
    pub fn timed_wait(&self, timeout: Duration) -> bool {
        let deadline = deadline_after(Instant::now(), timeout);
        let mut signaled = self.signaled.lock().unwrap();

        while !*signaled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }

            signaled = self.condvar.wait_timeout(signaled, deadline - now).unwrap().0;
        }

        true
    }
}
