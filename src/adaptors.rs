//! Single-step adaptors, and the `|` composition syntax.
//!
//! An adaptor takes a sender and returns a new one. Adaptors are usually applied with `|`:
//!
//! ```
//! use fanin::{just, then, sync_wait};
//!
//! let doubled = just(21) | then(|(x,): (i32,)| (x * 2,));
//! assert_eq!(sync_wait::<(i32,), std::convert::Infallible, _>(doubled).ok(), Some(Some((42,))));
//! ```
//!
//! `|` is available on every sender defined in this crate. For senders defined elsewhere, the
//! [`SenderExt`] methods do the same.
//!
//! Value payloads are tuples on both ends: the closure passed to [`then`] receives the payload
//! tuple and returns the new one.

use crate::env::{EmptyEnv, Env};
use crate::race::{self, StopWhen, WithController};
use crate::signatures::{
    Answered, CompletionSignaturesOf, Cons, Nil, Queried, QuerySignatures, Resolve, SetError,
    SetStopped, SetValue, SigList,
};
use crate::sync_wait::{SenderFuture, SyncWaitReceiver, WaitError};
use crate::{
    Connect, ReceiveError, ReceiveStopped, ReceiveValue, Receiver, ReceiverOf, Sender,
};

/// Something that turns a sender `S` into another sender.
pub trait Adaptor<S> {
    type Output;

    fn adapt(self, sender: S) -> Self::Output;
}

/// Implements `sender | adaptor` for a sender type of this crate.
macro_rules! pipeable {
    ($ty:ident $(<$($param:ident),*>)?) => {
        impl<$($($param,)*)? A> ::std::ops::BitOr<A> for $ty$(<$($param),*>)?
        where
            A: $crate::adaptors::Adaptor<$ty$(<$($param),*>)?>,
        {
            type Output = A::Output;

            fn bitor(self, adaptor: A) -> A::Output {
                adaptor.adapt(self)
            }
        }
    };
}

pub(crate) use pipeable;

/// Maps every value payload `P` of `S` through `F: FnOnce(P) -> Q`.
pub struct Then<S, F> {
    sender: S,
    f: F,
}

/// Replaces the stopped completion of `S` with `set_value(F())`.
pub struct UponStopped<S, F> {
    sender: S,
    f: F,
}

/// Adaptor form of [`Then`].
pub struct ThenAdaptor<F>(F);

/// Adaptor form of [`UponStopped`].
pub struct UponStoppedAdaptor<F>(F);

/// Adaptor form of [`stop_when`](crate::stop_when): `sender | stop_when(controller)`.
pub struct StopWhenAdaptor<C>(C);

/// Maps every value payload through `f`.
pub fn then<F>(f: F) -> ThenAdaptor<F> {
    ThenAdaptor(f)
}

/// Turns the stopped completion into `set_value(f())`.
pub fn upon_stopped<F>(f: F) -> UponStoppedAdaptor<F> {
    UponStoppedAdaptor(f)
}

/// Stops the piped sender as soon as `controller` completes.
///
/// `sender | stop_when(controller)` is [`crate::stop_when(controller, (sender,))`](crate::stop_when).
pub fn stop_when<C>(controller: C) -> StopWhenAdaptor<C> {
    StopWhenAdaptor(controller)
}

impl<S, F> Adaptor<S> for ThenAdaptor<F> {
    type Output = Then<S, F>;

    fn adapt(self, sender: S) -> Then<S, F> {
        Then { sender, f: self.0 }
    }
}

impl<S, F> Adaptor<S> for UponStoppedAdaptor<F> {
    type Output = UponStopped<S, F>;

    fn adapt(self, sender: S) -> UponStopped<S, F> {
        UponStopped { sender, f: self.0 }
    }
}

impl<S, C> Adaptor<S> for StopWhenAdaptor<C> {
    type Output = StopWhen<C, (S,)>;

    fn adapt(self, sender: S) -> StopWhen<C, (S,)> {
        race::stop_when(self.0, (sender,))
    }
}

pipeable!(Then<S, F>);
pipeable!(UponStopped<S, F>);

/// Signature lists whose value signatures can be mapped through `F`.
pub trait MapValues<F> {
    type Output: SigList;
}

impl<F> MapValues<F> for Nil {
    type Output = Nil;
}

impl<F, P, Q, T> MapValues<F> for Cons<SetValue<P>, T>
where
    F: FnOnce(P) -> Q,
    P: 'static,
    Q: 'static,
    T: MapValues<F>,
{
    type Output = Cons<SetValue<Q>, T::Output>;
}

impl<F, E: 'static, T: MapValues<F>> MapValues<F> for Cons<SetError<E>, T> {
    type Output = Cons<SetError<E>, T::Output>;
}

impl<F, T: MapValues<F>> MapValues<F> for Cons<SetStopped, T> {
    type Output = Cons<SetStopped, T::Output>;
}

/// Signature lists whose stopped signatures can be replaced by `set_value(F())`.
pub trait MapStopped<F> {
    type Output: SigList;
}

impl<F> MapStopped<F> for Nil {
    type Output = Nil;
}

impl<F, P: 'static, T: MapStopped<F>> MapStopped<F> for Cons<SetValue<P>, T> {
    type Output = Cons<SetValue<P>, T::Output>;
}

impl<F, E: 'static, T: MapStopped<F>> MapStopped<F> for Cons<SetError<E>, T> {
    type Output = Cons<SetError<E>, T::Output>;
}

impl<F, Q, T> MapStopped<F> for Cons<SetStopped, T>
where
    F: FnOnce() -> Q,
    Q: 'static,
    T: MapStopped<F>,
{
    type Output = Cons<SetValue<Q>, T::Output>;
}

impl<S, F> Sender for Then<S, F> {
    type Source = Queried;
}

impl<S, F, E> QuerySignatures<E> for Then<S, F>
where
    E: Env,
    S: Sender,
    S::Source: Resolve<S, E>,
    CompletionSignaturesOf<S, E>: MapValues<F>,
{
    type Answer = Answered<<CompletionSignaturesOf<S, E> as MapValues<F>>::Output>;
}

impl<S, F> Sender for UponStopped<S, F> {
    type Source = Queried;
}

impl<S, F, E> QuerySignatures<E> for UponStopped<S, F>
where
    E: Env,
    S: Sender,
    S::Source: Resolve<S, E>,
    CompletionSignaturesOf<S, E>: MapStopped<F>,
{
    type Answer = Answered<<CompletionSignaturesOf<S, E> as MapStopped<F>>::Output>;
}

/// Receiver applying `F` to values before passing them on to `R`.
pub struct ThenReceiver<R, F> {
    receiver: R,
    f: F,
}

impl<R: Receiver, F> Receiver for ThenReceiver<R, F> {
    type Env = R::Env;

    fn env(&self) -> R::Env {
        self.receiver.env()
    }
}

impl<R, F, P, Q> ReceiveValue<P> for ThenReceiver<R, F>
where
    R: ReceiveValue<Q>,
    F: FnOnce(P) -> Q,
{
    fn set_value(self, values: P) {
        self.receiver.set_value((self.f)(values))
    }
}

impl<R: ReceiveError<E>, F, E> ReceiveError<E> for ThenReceiver<R, F> {
    fn set_error(self, error: E) {
        self.receiver.set_error(error)
    }
}

impl<R: ReceiveStopped, F> ReceiveStopped for ThenReceiver<R, F> {
    fn set_stopped(self) {
        self.receiver.set_stopped()
    }
}

impl<S, F, R> Connect<R> for Then<S, F>
where
    R: Receiver,
    S: Connect<ThenReceiver<R, F>>,
{
    type Operation = S::Operation;

    fn connect(self, receiver: R) -> S::Operation {
        self.sender.connect(ThenReceiver { receiver, f: self.f })
    }
}

impl<'a, S, F, R> Connect<R> for &'a Then<S, F>
where
    R: Receiver,
    F: Clone,
    &'a S: Connect<ThenReceiver<R, F>>,
{
    type Operation = <&'a S as Connect<ThenReceiver<R, F>>>::Operation;

    fn connect(self, receiver: R) -> Self::Operation {
        let f = self.f.clone();
        (&self.sender).connect(ThenReceiver { receiver, f })
    }
}

/// Receiver turning `set_stopped` into `set_value(F())` for `R`.
pub struct UponStoppedReceiver<R, F> {
    receiver: R,
    f: F,
}

impl<R: Receiver, F> Receiver for UponStoppedReceiver<R, F> {
    type Env = R::Env;

    fn env(&self) -> R::Env {
        self.receiver.env()
    }
}

impl<R: ReceiveValue<P>, F, P> ReceiveValue<P> for UponStoppedReceiver<R, F> {
    fn set_value(self, values: P) {
        self.receiver.set_value(values)
    }
}

impl<R: ReceiveError<E>, F, E> ReceiveError<E> for UponStoppedReceiver<R, F> {
    fn set_error(self, error: E) {
        self.receiver.set_error(error)
    }
}

impl<R, F, Q> ReceiveStopped for UponStoppedReceiver<R, F>
where
    R: ReceiveValue<Q>,
    F: FnOnce() -> Q,
{
    fn set_stopped(self) {
        self.receiver.set_value((self.f)())
    }
}

impl<S, F, R> Connect<R> for UponStopped<S, F>
where
    R: Receiver,
    S: Connect<UponStoppedReceiver<R, F>>,
{
    type Operation = S::Operation;

    fn connect(self, receiver: R) -> S::Operation {
        self.sender
            .connect(UponStoppedReceiver { receiver, f: self.f })
    }
}

impl<'a, S, F, R> Connect<R> for &'a UponStopped<S, F>
where
    R: Receiver,
    F: Clone,
    &'a S: Connect<UponStoppedReceiver<R, F>>,
{
    type Operation = <&'a S as Connect<UponStoppedReceiver<R, F>>>::Operation;

    fn connect(self, receiver: R) -> Self::Operation {
        let f = self.f.clone();
        (&self.sender).connect(UponStoppedReceiver { receiver, f })
    }
}

/// Method forms of the adaptors, for any sender.
pub trait SenderExt: Sender + Sized {
    fn then<F>(self, f: F) -> Then<Self, F> {
        then(f).adapt(self)
    }

    fn upon_stopped<F>(self, f: F) -> UponStopped<Self, F> {
        upon_stopped(f).adapt(self)
    }

    /// `self.stop_when(controller)` is [`crate::stop_when(controller, (self,))`](crate::stop_when).
    fn stop_when<C>(self, controller: C) -> StopWhen<C, (Self,)>
    where
        (Self,): WithController<C>,
    {
        race::stop_when(controller, (self,))
    }

    /// Connects and starts `self` on first poll, resolving to its outcome.
    fn into_future<V, E>(self) -> SenderFuture<Self, V, E>
    where
        Self: Connect<SyncWaitReceiver<V, E>>,
    {
        SenderFuture::new(self)
    }

    /// Blocks the current thread until `self` completes. See [`sync_wait`](crate::sync_wait()).
    fn sync_wait<V, E>(self) -> Result<Option<V>, WaitError<E>>
    where
        Self: Connect<SyncWaitReceiver<V, E>>,
        Self::Source: Resolve<Self, EmptyEnv>,
        SyncWaitReceiver<V, E>: ReceiverOf<CompletionSignaturesOf<Self, EmptyEnv>>,
    {
        crate::sync_wait::sync_wait(self)
    }
}

impl<S: Sender> SenderExt for S {}
