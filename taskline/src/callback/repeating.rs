use super::functor::{OnceFunctor, RepeatingFunctor};
use super::invoker::RepeatingInvoker;
use super::once::OnceCallback;

use std::fmt;

/// A callback that can be run any number of times and freely cloned.
///
/// Cloning a `RepeatingCallback` duplicates the target and every bound
/// argument, so running one clone never affects the bound state seen by
/// another. Bound arguments are cloned again on every run, which lets the
/// target take them by value.
///
/// # Examples
///
/// ```rust
/// use taskline::callback::bind_repeating;
///
/// let cb = bind_repeating(|x: i32, y: i32| x * y, (6,));
/// assert_eq!(cb.run((7,)), 42);
/// assert_eq!(cb.run((2,)), 12);
/// ```
#[must_use = "a callback does nothing unless it is run"]
pub struct RepeatingCallback<Args, R = ()> {
    invoker: Option<Box<dyn RepeatingInvoker<Args, R> + Send>>,
}

/// A repeating callback without arguments or result.
pub type RepeatingClosure = RepeatingCallback<(), ()>;

impl<Args, R> RepeatingCallback<Args, R> {
    pub(crate) fn from_invoker(invoker: Box<dyn RepeatingInvoker<Args, R> + Send>) -> Self {
        Self {
            invoker: Some(invoker),
        }
    }

    /// Runs the callback without consuming it.
    ///
    /// # Panics
    ///
    /// Panics if the callback is empty.
    pub fn run(&self, args: Args) -> R {
        match &self.invoker {
            Some(invoker) => invoker.invoke(args),
            None => panic!("RepeatingCallback::run called on an empty callback"),
        }
    }

    /// Returns `true` if the callback holds no target.
    pub fn is_null(&self) -> bool {
        self.invoker.is_none()
    }

    /// Produces a once callback backed by a clone of this callback's state.
    ///
    /// `self` stays valid and can keep running independently.
    pub fn to_once(&self) -> OnceCallback<Args, R> {
        match &self.invoker {
            Some(invoker) => OnceCallback::from_invoker(invoker.clone_once()),
            None => OnceCallback::default(),
        }
    }
}

impl<Args, R> Clone for RepeatingCallback<Args, R> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.as_ref().map(|invoker| invoker.clone_repeating()),
        }
    }
}

impl<Args, R> Default for RepeatingCallback<Args, R> {
    /// Creates an empty callback.
    fn default() -> Self {
        Self { invoker: None }
    }
}

impl<Args, R> fmt::Debug for RepeatingCallback<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatingCallback")
            .field("null", &self.is_null())
            .finish()
    }
}

impl<Args, R> From<RepeatingCallback<Args, R>> for OnceCallback<Args, R> {
    fn from(callback: RepeatingCallback<Args, R>) -> Self {
        callback.to_once()
    }
}

impl<Args, R> OnceFunctor<Args> for RepeatingCallback<Args, R>
where
    Args: 'static,
    R: 'static,
{
    type Output = R;

    fn call_once(self, args: Args) -> R {
        self.run(args)
    }
}

impl<Args, R> RepeatingFunctor<Args> for RepeatingCallback<Args, R>
where
    Args: 'static,
    R: 'static,
{
    fn call(&self, args: Args) -> R {
        self.run(args)
    }
}
