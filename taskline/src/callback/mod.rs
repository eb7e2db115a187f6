//! Bound, type-erased callbacks.
//!
//! A callback packages a target (closure, function or another callback)
//! with some of its arguments, captured by value at bind time. The rest of
//! the arguments are supplied when the callback runs, as a tuple.
//!
//! Two ownership modes exist, and they are distinct types:
//! - [`OnceCallback`]: exclusively owned, consumed by [`OnceCallback::run`],
//! - [`RepeatingCallback`]: runnable any number of times, `Clone` with
//!   independent state, convertible into a [`OnceCallback`].
//!
//! Binding around an existing callback prepends more bound arguments,
//! which allows currying chains. Binding a method to a
//! [`WeakPtr`](crate::weak::WeakPtr) yields a callback that silently does
//! nothing once the pointer is invalidated.
//!
//! # Examples
//!
//! ```rust
//! use taskline::callback::{bind_once, bind_repeating};
//!
//! fn add(x: i32, y: i32) -> i32 {
//!     x + y
//! }
//!
//! let add_one = bind_repeating(add, (1,));
//! let four = bind_once(add_one.clone(), (3,));
//!
//! assert_eq!(add_one.run((9,)), 10);
//! assert_eq!(four.run(()), 4);
//! ```

mod args;
mod bind;
mod functor;
mod invoker;
mod once;
mod repeating;

pub use args::Split;
pub use bind::{WeakCall, bind_once, bind_repeating, bind_weak_once, bind_weak_repeating};
pub use functor::{OnceFunctor, RepeatingFunctor};
pub use once::{OnceCallback, OnceClosure};
pub use repeating::{RepeatingCallback, RepeatingClosure};
