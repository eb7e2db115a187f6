//! Uniform calling convention for bind targets.
//!
//! Plain closures and function items take their arguments positionally,
//! callbacks take a tuple. The functor traits erase that difference so the
//! binding machinery only ever deals with argument tuples.

/// A target that can be called once with the argument tuple `Args`.
pub trait OnceFunctor<Args>: Send + 'static {
    type Output;

    fn call_once(self, args: Args) -> Self::Output;
}

/// A target that can be called any number of times with `Args`.
///
/// Repeating targets are `Clone` so that a repeating callback can be
/// duplicated with independently owned state.
pub trait RepeatingFunctor<Args>: OnceFunctor<Args> + Clone {
    fn call(&self, args: Args) -> Self::Output;
}

macro_rules! impl_functor {
    ($($arg:ident),*) => {
        impl<Func, Ret, $($arg,)*> OnceFunctor<($($arg,)*)> for Func
        where
            Func: FnOnce($($arg),*) -> Ret + Send + 'static,
        {
            type Output = Ret;

            #[allow(non_snake_case)]
            #[inline]
            fn call_once(self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }

        impl<Func, Ret, $($arg,)*> RepeatingFunctor<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Ret + Clone + Send + 'static,
        {
            #[allow(non_snake_case)]
            #[inline]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_functor!();
impl_functor!(A);
impl_functor!(A, B);
impl_functor!(A, B, C);
impl_functor!(A, B, C, D);
impl_functor!(A, B, C, D, E);
impl_functor!(A, B, C, D, E, F);
impl_functor!(A, B, C, D, E, F, G);
impl_functor!(A, B, C, D, E, F, G, H);
