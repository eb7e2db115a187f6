//! Cross-thread signaling primitives.
//!
//! - [`WaitableEvent`]: a one-shot signal threads can block on,
//! - [`ScopedSignaller`]: a move-only guard that signals an event exactly
//!   once when it goes out of scope.

mod event;
mod signaller;

pub use event::WaitableEvent;
pub use signaller::ScopedSignaller;
