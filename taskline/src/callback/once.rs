use super::functor::OnceFunctor;
use super::invoker::OnceInvoker;

use std::fmt;
use std::mem;

/// A callback that can be run at most once.
///
/// A `OnceCallback` exclusively owns its target and bound arguments.
/// Running it consumes it, so the compiler rules out a second run of the
/// same value. The only way to observe the empty state is through
/// [`take`](Self::take) or [`Default`], and running an empty callback is a
/// programming error that panics.
///
/// `Args` is the tuple of arguments still to be supplied at run time and
/// `R` the value produced by the target.
///
/// # Examples
///
/// ```rust
/// use taskline::callback::bind_once;
///
/// fn add(x: i32, y: i32) -> i32 {
///     x + y
/// }
///
/// let cb = bind_once(add, (3,));
/// assert_eq!(cb.run((11,)), 14);
/// ```
#[must_use = "a callback does nothing unless it is run"]
pub struct OnceCallback<Args, R = ()> {
    invoker: Option<Box<dyn OnceInvoker<Args, R> + Send>>,
}

/// A once callback without arguments or result: the unit of work posted
/// to task runners.
pub type OnceClosure = OnceCallback<(), ()>;

impl<Args, R> OnceCallback<Args, R> {
    pub(crate) fn from_invoker(invoker: Box<dyn OnceInvoker<Args, R> + Send>) -> Self {
        Self {
            invoker: Some(invoker),
        }
    }

    /// Runs the callback, forwarding the bound arguments followed by `args`.
    ///
    /// # Panics
    ///
    /// Panics if the callback is empty (default-constructed or taken from).
    pub fn run(self, args: Args) -> R {
        match self.invoker {
            Some(invoker) => invoker.invoke(args),
            None => panic!("OnceCallback::run called on an empty callback"),
        }
    }

    /// Returns `true` if the callback holds no target.
    pub fn is_null(&self) -> bool {
        self.invoker.is_none()
    }

    /// Moves the callback out, leaving an empty one behind.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }
}

impl<Args, R> Default for OnceCallback<Args, R> {
    /// Creates an empty callback.
    fn default() -> Self {
        Self { invoker: None }
    }
}

impl<Args, R> fmt::Debug for OnceCallback<Args, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceCallback")
            .field("null", &self.is_null())
            .finish()
    }
}

/// Lets a once callback be the target of another bind, which prepends more
/// bound arguments to it.
impl<Args, R> OnceFunctor<Args> for OnceCallback<Args, R>
where
    Args: 'static,
    R: 'static,
{
    type Output = R;

    fn call_once(self, args: Args) -> R {
        self.run(args)
    }
}
