//! Argument tuples.
//!
//! Callbacks carry their arguments as tuples. Binding splits the full
//! parameter tuple of a target into a bound prefix (captured at bind time)
//! and the remaining suffix (supplied at run time).

/// A parameter tuple that can be split after the prefix `Bound`.
///
/// `Self` is the full parameter tuple of a target, `Bound` the arguments
/// captured by a bind call and [`Rest`](Self::Rest) the arguments left for
/// the call site. The trait is only implemented when `Bound` is an exact
/// prefix of `Self`, which is how arity and type mismatches get rejected at
/// bind time.
pub trait Split<Bound>: Sized {
    /// Arguments still to be supplied when the callback runs.
    type Rest;

    /// Reassembles the full tuple from the bound prefix and the run-time
    /// suffix.
    fn join(bound: Bound, rest: Self::Rest) -> Self;
}

macro_rules! impl_split {
    (($($bound:ident),*), ($($rest:ident),*)) => {
        impl<$($bound,)* $($rest,)*> Split<($($bound,)*)> for ($($bound,)* $($rest,)*) {
            type Rest = ($($rest,)*);

            #[allow(non_snake_case, clippy::unused_unit)]
            #[inline]
            fn join(($($bound,)*): ($($bound,)*), ($($rest,)*): ($($rest,)*)) -> Self {
                ($($bound,)* $($rest,)*)
            }
        }
    };
}

/// Stamps out every split of one full tuple, moving one parameter at a time
/// from the run-time suffix to the bound prefix.
macro_rules! impl_splits {
    (($($bound:ident),*), ()) => {
        impl_split!(($($bound),*), ());
    };
    (($($bound:ident),*), ($head:ident $(, $rest:ident)*)) => {
        impl_split!(($($bound),*), ($head $(, $rest)*));
        impl_splits!(($($bound,)* $head), ($($rest),*));
    };
}

impl_splits!((), ());
impl_splits!((), (A));
impl_splits!((), (A, B));
impl_splits!((), (A, B, C));
impl_splits!((), (A, B, C, D));
impl_splits!((), (A, B, C, D, E));
impl_splits!((), (A, B, C, D, E, F));
impl_splits!((), (A, B, C, D, E, F, G));
impl_splits!((), (A, B, C, D, E, F, G, H));
