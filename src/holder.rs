//! Channel holders: a pending completion, parked until it can be delivered.
//!
//! Each holder is bound to one channel and stores that channel's payload. Delivering a holder
//! moves the payload into the matching completion call of a receiver, which happens exactly once
//! because delivery consumes the holder.
//!
//! [`Completion`] is the tagged union over the three holders, for code that needs to store "some
//! outcome" with known value and error types. [`ErasedHolder`] is the boxed form used when the
//! payload types vary from child to child, as in the race combinators.

use crate::{ReceiveError, ReceiveStopped, ReceiveValue};

/// Hands a stored completion to a receiver.
pub trait Deliver<R> {
    fn deliver(self, receiver: R);
}

/// Holds a value payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueHolder<P>(pub P);

/// Holds an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorHolder<E>(pub E);

/// Marks a stopped completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoppedHolder;

impl<P> ValueHolder<P> {
    pub fn new(values: P) -> Self {
        Self(values)
    }
}

impl<E> ErrorHolder<E> {
    pub fn new(error: E) -> Self {
        Self(error)
    }
}

impl<R: ReceiveValue<P>, P> Deliver<R> for ValueHolder<P> {
    fn deliver(self, receiver: R) {
        receiver.set_value(self.0)
    }
}

impl<R: ReceiveError<E>, E> Deliver<R> for ErrorHolder<E> {
    fn deliver(self, receiver: R) {
        receiver.set_error(self.0)
    }
}

impl<R: ReceiveStopped> Deliver<R> for StoppedHolder {
    fn deliver(self, receiver: R) {
        receiver.set_stopped()
    }
}

/// Any one outcome of a sender with value payload `V` and error `E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<V, E> {
    Value(V),
    Error(E),
    Stopped,
}

impl<V, E> Completion<V, E> {
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

impl<V, E> From<ValueHolder<V>> for Completion<V, E> {
    fn from(holder: ValueHolder<V>) -> Self {
        Self::Value(holder.0)
    }
}

impl<V, E> From<ErrorHolder<E>> for Completion<V, E> {
    fn from(holder: ErrorHolder<E>) -> Self {
        Self::Error(holder.0)
    }
}

impl<V, E> From<StoppedHolder> for Completion<V, E> {
    fn from(StoppedHolder: StoppedHolder) -> Self {
        Self::Stopped
    }
}

impl<R, V, E> Deliver<R> for Completion<V, E>
where
    R: ReceiveValue<V> + ReceiveError<E> + ReceiveStopped,
{
    fn deliver(self, receiver: R) {
        match self {
            Self::Value(values) => ValueHolder(values).deliver(receiver),
            Self::Error(error) => ErrorHolder(error).deliver(receiver),
            Self::Stopped => StoppedHolder.deliver(receiver),
        }
    }
}

/// A holder behind a box, deliverable to `R` whatever channel it came from.
pub trait ErasedHolder<R>: Send {
    fn deliver_boxed(self: Box<Self>, receiver: R);
}

impl<R, H: Deliver<R> + Send> ErasedHolder<R> for H {
    fn deliver_boxed(self: Box<Self>, receiver: R) {
        (*self).deliver(receiver)
    }
}

/// An owned, type-erased pending completion for receiver `R`.
pub type BoxedHolder<R> = Box<dyn ErasedHolder<R>>;
