use super::args::Split;
use super::functor::{OnceFunctor, RepeatingFunctor};
use super::invoker::BindState;
use super::once::OnceCallback;
use super::repeating::RepeatingCallback;
use crate::weak::WeakPtr;

/// Binds `bound` to the leading parameters of `target` and returns a
/// callback that can run once.
///
/// `target` may be a closure, a function item or another callback. The
/// bound tuple must match a prefix of the target's parameters; anything
/// else fails to compile. The remaining parameters become the callback's
/// `Args`.
///
/// # Examples
///
/// ```rust
/// use taskline::callback::bind_once;
///
/// let greeting = bind_once(|name: String, punct: char| format!("hi {name}{punct}"), ("ada".to_string(),));
/// assert_eq!(greeting.run(('!',)), "hi ada!");
/// ```
pub fn bind_once<F, Full, Bound>(
    target: F,
    bound: Bound,
) -> OnceCallback<<Full as Split<Bound>>::Rest, F::Output>
where
    F: OnceFunctor<Full>,
    Full: Split<Bound> + 'static,
    Bound: Send + 'static,
{
    OnceCallback::from_invoker(Box::new(BindState::<F, Bound, Full>::new(target, bound)))
}

/// Binds `bound` to the leading parameters of `target` and returns a
/// callback that can run any number of times.
///
/// Bound arguments must be `Clone`: each run hands the target a fresh
/// copy.
pub fn bind_repeating<F, Full, Bound>(
    target: F,
    bound: Bound,
) -> RepeatingCallback<<Full as Split<Bound>>::Rest, F::Output>
where
    F: RepeatingFunctor<Full>,
    Full: Split<Bound> + 'static,
    Bound: Clone + Send + 'static,
{
    RepeatingCallback::from_invoker(Box::new(BindState::<F, Bound, Full>::new(target, bound)))
}

/// Like [`bind_once`], but `method` receives the target of `receiver` as
/// its first parameter.
///
/// The pointer is checked when the callback runs. If it has been
/// invalidated (or was empty to begin with), `method` is not called and the
/// callback returns `R::default()`.
pub fn bind_weak_once<T, M, Full, Bound>(
    method: M,
    receiver: WeakPtr<T>,
    bound: Bound,
) -> OnceCallback<<Full as Split<Bound>>::Rest, <WeakCall<T, M> as OnceFunctor<Full>>::Output>
where
    WeakCall<T, M>: OnceFunctor<Full>,
    Full: Split<Bound> + 'static,
    Bound: Send + 'static,
{
    bind_once(WeakCall::new(receiver, method), bound)
}

/// Repeating counterpart of [`bind_weak_once`]; the pointer is re-checked
/// on every run.
pub fn bind_weak_repeating<T, M, Full, Bound>(
    method: M,
    receiver: WeakPtr<T>,
    bound: Bound,
) -> RepeatingCallback<
    <Full as Split<Bound>>::Rest,
    <WeakCall<T, M> as OnceFunctor<Full>>::Output,
>
where
    WeakCall<T, M>: RepeatingFunctor<Full>,
    Full: Split<Bound> + 'static,
    Bound: Clone + Send + 'static,
{
    bind_repeating(WeakCall::new(receiver, method), bound)
}

/// A method bound to a weak receiver.
///
/// Built by [`bind_weak_once`] and [`bind_weak_repeating`]; only useful as a
/// bind target.
pub struct WeakCall<T, M> {
    receiver: WeakPtr<T>,
    method: M,
}

impl<T, M> WeakCall<T, M> {
    fn new(receiver: WeakPtr<T>, method: M) -> Self {
        Self { receiver, method }
    }
}

impl<T, M: Clone> Clone for WeakCall<T, M> {
    fn clone(&self) -> Self {
        Self::new(self.receiver.clone(), self.method.clone())
    }
}

macro_rules! impl_weak_call {
    ($($arg:ident),*) => {
        impl<T, M, Ret, $($arg,)*> OnceFunctor<($($arg,)*)> for WeakCall<T, M>
        where
            T: Send + Sync + 'static,
            M: FnOnce(&T $(, $arg)*) -> Ret + Send + 'static,
            Ret: Default,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            fn call_once(self, ($($arg,)*): ($($arg,)*)) -> Ret {
                let WeakCall { receiver, method } = self;
                receiver
                    .with(move |target| method(target $(, $arg)*))
                    .unwrap_or_default()
            }
        }

        impl<T, M, Ret, $($arg,)*> RepeatingFunctor<($($arg,)*)> for WeakCall<T, M>
        where
            T: Send + Sync + 'static,
            M: Fn(&T $(, $arg)*) -> Ret + Clone + Send + 'static,
            Ret: Default,
        {
            #[allow(non_snake_case)]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self.receiver
                    .with(|target| (self.method)(target $(, $arg)*))
                    .unwrap_or_default()
            }
        }
    };
}

impl_weak_call!();
impl_weak_call!(A);
impl_weak_call!(A, B);
impl_weak_call!(A, B, C);
impl_weak_call!(A, B, C, D);
impl_weak_call!(A, B, C, D, E);
impl_weak_call!(A, B, C, D, E, F);
impl_weak_call!(A, B, C, D, E, F, G);
impl_weak_call!(A, B, C, D, E, F, G, H);
