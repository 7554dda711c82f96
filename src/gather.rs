//! Gathering: turning a sender's signatures into ordinary types.
//!
//! Gathering filters a sender's signatures by channel, then applies two aggregators:
//!
//! - a *per-completion* aggregator ([`PayloadFn`]), applied to the argument tuple of each matching
//!   signature,
//! - a *cross-completion* aggregator ([`ListFn`]), applied to the list of per-completion results.
//!
//! ```
//! use fanin::gather::{Identity, Tuple, ValueTypesOf, Variant, OneOf, Empty};
//! use fanin::just::Just;
//!
//! // One value signature with a single payload collapses all the way down.
//! let _: ValueTypesOf<Just<(i32,)>, fanin::env::EmptyEnv, Identity, Identity> = 42i32;
//!
//! // Or stays wrapped, if asked to.
//! let _: ValueTypesOf<Just<(i32,)>, fanin::env::EmptyEnv, Tuple, Variant> =
//!     OneOf::<(i32,), Empty>::Here((42,));
//! ```
//!
//! A channel without signatures gathers to the cross-completion aggregator over nothing, for
//! [`Variant`] the uninhabited [`Empty`].

use crate::signatures::{
    CompletionSignaturesOf, Cons, ErrorChannel, Nil, Signature, SigList, StoppedChannel,
    ValueChannel,
};

/// A per-completion aggregator, mapping an argument tuple `P` to a type.
pub trait PayloadFn<P> {
    type Output;
}

/// A cross-completion aggregator, mapping a type-level list ([`Nil`]/[`Cons`]) to a type.
pub trait ListFn<L> {
    type Output;
}

/// Keeps the argument tuple as it is.
pub struct Tuple;

/// Passes a single item through unchanged: a one-element tuple as a per-completion aggregator, a
/// one-element list as a cross-completion aggregator.
pub struct Identity;

/// Wraps a single argument in an [`Option`].
pub struct Optional;

/// Turns a list into the nested sum type [`OneOf`], terminated by [`Empty`].
pub struct Variant;

/// Keeps the type-level list as it is.
pub struct List;

/// One of `H` or the alternatives in `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOf<H, T> {
    Here(H),
    There(T),
}

/// The sum of no alternatives; a value of this type cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Empty {}

impl<P> PayloadFn<P> for Tuple {
    type Output = P;
}

impl<T> PayloadFn<(T,)> for Identity {
    type Output = T;
}

impl<T> PayloadFn<(T,)> for Optional {
    type Output = Option<T>;
}

impl<T> ListFn<Cons<T, Nil>> for Identity {
    type Output = T;
}

impl ListFn<Nil> for Variant {
    type Output = Empty;
}

impl<H, T> ListFn<Cons<H, T>> for Variant
where
    Variant: ListFn<T>,
{
    type Output = OneOf<H, <Variant as ListFn<T>>::Output>;
}

impl<L> ListFn<L> for List {
    type Output = L;
}

/// Applies `F` to the arguments of every signature in a list, giving a list of results.
pub trait MapArgs<F> {
    type Output;
}

impl<F> MapArgs<F> for Nil {
    type Output = Nil;
}

impl<F, H, T> MapArgs<F> for Cons<H, T>
where
    H: Signature,
    F: PayloadFn<H::Args>,
    T: MapArgs<F>,
{
    type Output = Cons<<F as PayloadFn<H::Args>>::Output, <T as MapArgs<F>>::Output>;
}

/// Gathers the signatures of `S` in `E` on channel `C` through `Per`, then `Cross`.
pub type GatherSignatures<C, S, E, Per, Cross> = <Cross as ListFn<
    <<CompletionSignaturesOf<S, E> as SigList>::Filter<C> as MapArgs<Per>>::Output,
>>::Output;

/// Gathers the value payloads of `S` in `E`.
pub type ValueTypesOf<S, E, Per = Tuple, Cross = Variant> =
    GatherSignatures<ValueChannel, S, E, Per, Cross>;

/// Gathers the errors of `S` in `E`.
pub type ErrorTypesOf<S, E, Per = Tuple, Cross = Variant> =
    GatherSignatures<ErrorChannel, S, E, Per, Cross>;

/// Gathers the (empty) arguments of the stopped signatures of `S` in `E`.
pub type StoppedTypesOf<S, E, Per = Tuple, Cross = Variant> =
    GatherSignatures<StoppedChannel, S, E, Per, Cross>;
