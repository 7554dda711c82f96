//! Completion signatures: the type-level description of every way a sender can finish.
//!
//! A completion signature pairs a *channel* with the types passed along it:
//!
//! - [`SetValue<P>`]: success, with the payload tuple `P` (`()` for no values).
//! - [`SetError<E>`]: failure, with exactly one error of type `E`.
//! - [`SetStopped`]: cooperative cancellation, with nothing.
//!
//! A sender advertises an ordered list of signatures, built from [`Nil`] and [`Cons`].
//! The [`sigs!`](crate::sigs) macro spells such lists the way one would write them out:
//!
//! ```
//! use fanin::{sigs, signatures::{SetError, SetStopped, SetValue}};
//!
//! type Sigs = sigs![SetValue<(i32,)>, SetError<std::io::Error>, SetStopped];
//! ```
//!
//! # Declared signatures and queries
//!
//! There are two ways for a sender to answer "what can you send?":
//!
//! - [`DeclaredSignatures`] is a fixed answer, independent of who asks.
//! - [`QuerySignatures<E>`] is asked per environment `E`, so the outcome set may depend on the
//!   receiver it will be connected to (for example, whether stop can ever be requested).
//!
//! The sender picks where resolution starts through [`Sender::Source`](crate::Sender::Source).
//! [`Declared`] senders are never asked. [`Queried`] senders are asked first: an [`Answered`]
//! list wins over any declared default, and [`Unanswered`] falls back to
//! [`DeclaredSignatures`]. [`CompletionSignaturesOf`] performs that resolution.
//!
//! ```
//! use fanin::env::{EmptyEnv, StopEnv};
//! use fanin::signatures::*;
//! use fanin::{sigs, Sender};
//!
//! struct Ticker;
//!
//! impl Sender for Ticker {
//!     type Source = Queried;
//! }
//!
//! impl DeclaredSignatures for Ticker {
//!     type Signatures = sigs![SetValue<()>];
//! }
//!
//! impl QuerySignatures<StopEnv> for Ticker {
//!     type Answer = Answered<sigs![SetValue<()>, SetStopped]>;
//! }
//!
//! impl QuerySignatures<EmptyEnv> for Ticker {
//!     type Answer = Unanswered;
//! }
//!
//! assert!(sends_stopped::<Ticker, StopEnv>());
//! assert!(!sends_stopped::<Ticker, EmptyEnv>());
//! ```

use crate::env::{EmptyEnv, Env};
use crate::Sender;
use std::marker::PhantomData;

/// The empty signature list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nil;

/// A signature list with `H` in front of `T`.
pub struct Cons<H, T>(PhantomData<fn() -> (H, T)>);

/// Success, carrying the payload tuple `P`.
pub struct SetValue<P>(PhantomData<fn() -> P>);

/// Failure, carrying one error of type `E`.
pub struct SetError<E>(PhantomData<fn() -> E>);

/// Cooperative cancellation.
pub struct SetStopped;

/// Builds a [`Cons`]-list type from a comma-separated list of signatures.
#[macro_export]
macro_rules! sigs {
    () => { $crate::signatures::Nil };
    ($head:ty $(, $tail:ty)* $(,)?) => {
        $crate::signatures::Cons<$head, $crate::sigs!($($tail),*)>
    };
}

/// One of the three completion channels, used as a filter tag.
pub trait Channel: 'static {
    /// Picks `V`, `E` or `S` depending on which channel `Self` is.
    type Pick<V: SigList, E: SigList, S: SigList>: SigList;
}

/// Tag for the value channel.
pub struct ValueChannel;
/// Tag for the error channel.
pub struct ErrorChannel;
/// Tag for the stopped channel.
pub struct StoppedChannel;

impl Channel for ValueChannel {
    type Pick<V: SigList, E: SigList, S: SigList> = V;
}

impl Channel for ErrorChannel {
    type Pick<V: SigList, E: SigList, S: SigList> = E;
}

impl Channel for StoppedChannel {
    type Pick<V: SigList, E: SigList, S: SigList> = S;
}

/// A single completion signature.
pub trait Signature: 'static {
    /// The channel this signature completes on.
    type Channel: Channel;
    /// The arguments of the completion call, as a tuple.
    type Args;
    /// `Cons<Self, Rest>` if `Self` completes on channel `C`, otherwise `Rest`.
    type KeepIf<C: Channel, Rest: SigList>: SigList;
}

impl<P: 'static> Signature for SetValue<P> {
    type Channel = ValueChannel;
    type Args = P;
    type KeepIf<C: Channel, Rest: SigList> = C::Pick<Cons<Self, Rest>, Rest, Rest>;
}

impl<E: 'static> Signature for SetError<E> {
    type Channel = ErrorChannel;
    type Args = (E,);
    type KeepIf<C: Channel, Rest: SigList> = C::Pick<Rest, Cons<Self, Rest>, Rest>;
}

impl Signature for SetStopped {
    type Channel = StoppedChannel;
    type Args = ();
    type KeepIf<C: Channel, Rest: SigList> = C::Pick<Rest, Rest, Cons<Self, Rest>>;
}

/// A type-level list of completion signatures.
pub trait SigList: 'static {
    /// Number of signatures in the list.
    const LEN: usize;
    /// `Self` followed by `R`.
    type Concat<R: SigList>: SigList;
    /// The signatures of `Self` completing on channel `C`, in order.
    type Filter<C: Channel>: SigList;
}

impl SigList for Nil {
    const LEN: usize = 0;
    type Concat<R: SigList> = R;
    type Filter<C: Channel> = Nil;
}

impl<H: Signature, T: SigList> SigList for Cons<H, T> {
    const LEN: usize = 1 + T::LEN;
    type Concat<R: SigList> = Cons<H, T::Concat<R>>;
    type Filter<C: Channel> = H::KeepIf<C, T::Filter<C>>;
}

/// Signatures a sender declares regardless of environment.
pub trait DeclaredSignatures {
    type Signatures: SigList;
}

/// What a sender says when asked for its signatures in environment `E`.
///
/// `Answer` is either [`Answered<L>`] or [`Unanswered`].
pub trait QuerySignatures<E: Env> {
    type Answer;
}

/// The query was answered with the list `L`.
pub struct Answered<L>(PhantomData<fn() -> L>);

/// The query has no answer in this environment; the sender's declared signatures apply.
pub struct Unanswered;

/// Turns the answer to a query made to `S` into a signature list.
pub trait QueryAnswer<S: ?Sized> {
    type Signatures: SigList;
}

impl<S: ?Sized, L: SigList> QueryAnswer<S> for Answered<L> {
    type Signatures = L;
}

impl<S: DeclaredSignatures + ?Sized> QueryAnswer<S> for Unanswered {
    type Signatures = S::Signatures;
}

impl<S: DeclaredSignatures + ?Sized> DeclaredSignatures for &S {
    type Signatures = S::Signatures;
}

impl<S: QuerySignatures<E> + ?Sized, E: Env> QuerySignatures<E> for &S {
    type Answer = S::Answer;
}

/// [`Sender::Source`](crate::Sender::Source) for senders answering with [`DeclaredSignatures`].
pub struct Declared;

/// [`Sender::Source`](crate::Sender::Source) for senders asked through [`QuerySignatures`]
/// first, falling back to [`DeclaredSignatures`] when unanswered.
pub struct Queried;

/// Resolves the signatures of `S` in environment `E` through the mechanism `Self` names.
pub trait Resolve<S: ?Sized, E> {
    type Signatures: SigList;
}

impl<S: DeclaredSignatures + ?Sized, E> Resolve<S, E> for Declared {
    type Signatures = S::Signatures;
}

impl<S, E> Resolve<S, E> for Queried
where
    S: QuerySignatures<E> + ?Sized,
    <S as QuerySignatures<E>>::Answer: QueryAnswer<S>,
    E: Env,
{
    type Signatures = <<S as QuerySignatures<E>>::Answer as QueryAnswer<S>>::Signatures;
}

/// The completion signatures of sender `S` when connected in environment `E`.
pub type CompletionSignaturesOf<S, E = EmptyEnv> =
    <<S as Sender>::Source as Resolve<S, E>>::Signatures;

/// The value-channel signatures of `S` in `E`.
pub type ValueSignaturesOf<S, E = EmptyEnv> =
    <CompletionSignaturesOf<S, E> as SigList>::Filter<ValueChannel>;

/// The error-channel signatures of `S` in `E`.
pub type ErrorSignaturesOf<S, E = EmptyEnv> =
    <CompletionSignaturesOf<S, E> as SigList>::Filter<ErrorChannel>;

/// The stopped-channel signatures of `S` in `E`.
pub type StoppedSignaturesOf<S, E = EmptyEnv> =
    <CompletionSignaturesOf<S, E> as SigList>::Filter<StoppedChannel>;

/// Whether `S` may complete with `set_stopped` when connected in `E`.
pub const fn sends_stopped<S, E>() -> bool
where
    S: Sender,
    S::Source: Resolve<S, E>,
{
    <StoppedSignaturesOf<S, E> as SigList>::LEN != 0
}
