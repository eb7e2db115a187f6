//! # Taskline
//!
//! **Taskline** is a threading and scheduling runtime built on plain OS
//! threads. Application code packages work as callbacks, posts them to task
//! runners and lets worker threads run them, with ordering guaranteed
//! within each logical sequence.
//!
//! It offers:
//!
//! - **Deferred calls**: [`OnceCallback`](callback::OnceCallback) and
//!   [`RepeatingCallback`](callback::RepeatingCallback) with partial
//!   argument binding, composition and weak receivers
//! - **Task runners**: unsequenced, sequenced and single-thread runners
//!   backed by a [`WorkerThread`] or a [`ThreadPool`]
//! - **Sequences**: a [`SequenceId`](sequence::SequenceId) per logical
//!   execution context, visible from running tasks
//! - **Weak pointers**: [`WeakPtrFactory`](weak::WeakPtrFactory) handles
//!   that can be invalidated in bulk, so callbacks bound to a dead receiver
//!   are skipped
//! - **Signaling**: [`WaitableEvent`](sync::WaitableEvent) and
//!   [`ScopedSignaller`](sync::ScopedSignaller)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use taskline::callback::bind_once;
//! use taskline::sync::{ScopedSignaller, WaitableEvent};
//! use taskline::{WorkerThread, from_here};
//! use std::sync::Arc;
//!
//! #[taskline::main]
//! fn main() {
//!     let mut worker = WorkerThread::new();
//!     worker.start().unwrap();
//!
//!     let done = Arc::new(WaitableEvent::new());
//!     let signaller = ScopedSignaller::new(&done);
//!
//!     worker.task_runner().unwrap().post_task(
//!         from_here!(),
//!         bind_once(|_done: ScopedSignaller| println!("hello from a worker"), (signaller,)),
//!     );
//!
//!     done.wait();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`callback`]: Deferred calls and argument binding
//! - [`runtime`]: Task runners, worker threads and the thread pool
//! - [`sequence`]: Sequence identity
//! - [`sync`]: Events and scoped signallers
//! - [`weak`]: Invalidatable weak pointers

mod error;
mod init;
mod utils;

pub mod callback;
pub mod runtime;
pub mod sequence;
pub mod sync;
pub mod weak;

pub use error::{Error, Result};
pub use init::{InitOptions, deinitialize, initialize};
pub use runtime::{
    SequencedTaskRunner, SingleThreadTaskRunner, TaskRunner, ThreadPool, ThreadPoolBuilder,
    WorkerThread,
};

pub use taskline_macros::{main, test};

/// Returns the [`Location`](runtime::Location) of the macro invocation.
///
/// Used to tag posted tasks with where they were posted from.
///
/// # Examples
///
/// ```rust
/// let here = taskline::from_here!();
/// assert_eq!(here.file(), file!());
/// assert_eq!(here.line(), line!() - 2);
/// ```
#[macro_export]
macro_rules! from_here {
    () => {
        ::std::panic::Location::caller()
    };
}
