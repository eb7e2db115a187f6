use super::args::Split;
use super::functor::{OnceFunctor, RepeatingFunctor};

use std::marker::PhantomData;

/// Type-erased strategy behind a [`OnceCallback`](super::OnceCallback).
pub(crate) trait OnceInvoker<Args, R>: Send {
    fn invoke(self: Box<Self>, args: Args) -> R;
}

/// Type-erased strategy behind a [`RepeatingCallback`](super::RepeatingCallback).
///
/// Besides invoking, a repeating strategy knows how to duplicate itself,
/// either as another repeating strategy or as a consume-once one.
pub(crate) trait RepeatingInvoker<Args, R>: Send {
    fn invoke(&self, args: Args) -> R;

    fn clone_repeating(&self) -> Box<dyn RepeatingInvoker<Args, R> + Send>;

    fn clone_once(&self) -> Box<dyn OnceInvoker<Args, R> + Send>;
}

/// A target together with the arguments bound to it.
///
/// `Full` is the complete parameter tuple of the target; it only exists at
/// the type level so the remaining call-site arguments can be computed.
pub(crate) struct BindState<F, Bound, Full> {
    functor: F,
    bound: Bound,
    _full: PhantomData<fn(Full)>,
}

impl<F, Bound, Full> BindState<F, Bound, Full> {
    pub(crate) fn new(functor: F, bound: Bound) -> Self {
        Self {
            functor,
            bound,
            _full: PhantomData,
        }
    }
}

impl<F: Clone, Bound: Clone, Full> Clone for BindState<F, Bound, Full> {
    fn clone(&self) -> Self {
        Self::new(self.functor.clone(), self.bound.clone())
    }
}

impl<F, Bound, Full> OnceInvoker<<Full as Split<Bound>>::Rest, F::Output>
    for BindState<F, Bound, Full>
where
    F: OnceFunctor<Full>,
    Full: Split<Bound>,
    Bound: Send,
{
    fn invoke(self: Box<Self>, args: <Full as Split<Bound>>::Rest) -> F::Output {
        let BindState { functor, bound, .. } = *self;
        functor.call_once(Full::join(bound, args))
    }
}

impl<F, Bound, Full> RepeatingInvoker<<Full as Split<Bound>>::Rest, F::Output>
    for BindState<F, Bound, Full>
where
    F: RepeatingFunctor<Full>,
    Full: Split<Bound> + 'static,
    Bound: Clone + Send + 'static,
{
    fn invoke(&self, args: <Full as Split<Bound>>::Rest) -> F::Output {
        self.functor.call(Full::join(self.bound.clone(), args))
    }

    fn clone_repeating(
        &self,
    ) -> Box<dyn RepeatingInvoker<<Full as Split<Bound>>::Rest, F::Output> + Send> {
        Box::new(self.clone())
    }

    fn clone_once(&self) -> Box<dyn OnceInvoker<<Full as Split<Bound>>::Rest, F::Output> + Send> {
        Box::new(self.clone())
    }
}
