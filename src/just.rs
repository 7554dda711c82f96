//! Senders with a fixed outcome.
//!
//! [`just`], [`just_error`] and [`just_stopped`] complete as soon as they are started. [`never`]
//! completes only when its environment asks it to stop.

use crate::env::{Env, StopTokenOf};
use crate::signatures::{
    Answered, Cons, Declared, DeclaredSignatures, Nil, Queried, QuerySignatures, SetError,
    SetStopped, SetValue,
};
use crate::stop::{StopToken, StoppedVia};
use crate::{
    Connect, OperationState, ReceiveError, ReceiveStopped, ReceiveValue, Receiver, Sender,
};

/// Completes with `set_value` and the payload tuple `P`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Just<P>(P);

/// Completes with `set_error(E)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JustError<E>(E);

/// Completes with `set_stopped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JustStopped;

/// A sender of the single value `value`.
pub fn just<T>(value: T) -> Just<(T,)> {
    Just((value,))
}

/// A sender of the error `error`.
pub fn just_error<E>(error: E) -> JustError<E> {
    JustError(error)
}

/// A sender that is always stopped.
pub fn just_stopped() -> JustStopped {
    JustStopped
}

/// Never completes on its own. Completes with `set_stopped` once stop is requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Never;

/// A sender that waits for a stop request, and nothing else.
pub fn never() -> Never {
    Never
}

impl<P> From<P> for Just<P> {
    /// A sender of the payload tuple `values`; `Just::from(())` sends no values at all.
    fn from(values: P) -> Self {
        Just(values)
    }
}

crate::adaptors::pipeable!(Just<P>);
crate::adaptors::pipeable!(JustError<E>);
crate::adaptors::pipeable!(JustStopped);
crate::adaptors::pipeable!(Never);

impl<P> Sender for Just<P> {
    type Source = Declared;
}

impl<P: 'static> DeclaredSignatures for Just<P> {
    type Signatures = Cons<SetValue<P>, Nil>;
}

impl<E> Sender for JustError<E> {
    type Source = Declared;
}

impl<E: 'static> DeclaredSignatures for JustError<E> {
    type Signatures = Cons<SetError<E>, Nil>;
}

impl Sender for JustStopped {
    type Source = Declared;
}

impl DeclaredSignatures for JustStopped {
    type Signatures = Cons<SetStopped, Nil>;
}

/// Operation of [`Just`].
pub struct JustOp<R, P> {
    pending: Option<(R, P)>,
}

/// Operation of [`JustError`].
pub struct JustErrorOp<R, E> {
    pending: Option<(R, E)>,
}

/// Operation of [`JustStopped`].
pub struct JustStoppedOp<R> {
    receiver: Option<R>,
}

impl<R: ReceiveValue<P>, P> OperationState for JustOp<R, P> {
    fn start(&mut self) {
        if let Some((receiver, values)) = self.pending.take() {
            receiver.set_value(values)
        }
    }
}

impl<R: ReceiveError<E>, E> OperationState for JustErrorOp<R, E> {
    fn start(&mut self) {
        if let Some((receiver, error)) = self.pending.take() {
            receiver.set_error(error)
        }
    }
}

impl<R: ReceiveStopped> OperationState for JustStoppedOp<R> {
    fn start(&mut self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.set_stopped()
        }
    }
}

impl<R: ReceiveValue<P>, P> Connect<R> for Just<P> {
    type Operation = JustOp<R, P>;

    fn connect(self, receiver: R) -> JustOp<R, P> {
        JustOp {
            pending: Some((receiver, self.0)),
        }
    }
}

impl<R: ReceiveValue<P>, P: Clone> Connect<R> for &Just<P> {
    type Operation = JustOp<R, P>;

    fn connect(self, receiver: R) -> JustOp<R, P> {
        JustOp {
            pending: Some((receiver, self.0.clone())),
        }
    }
}

impl<R: ReceiveError<E>, E> Connect<R> for JustError<E> {
    type Operation = JustErrorOp<R, E>;

    fn connect(self, receiver: R) -> JustErrorOp<R, E> {
        JustErrorOp {
            pending: Some((receiver, self.0)),
        }
    }
}

impl<R: ReceiveError<E>, E: Clone> Connect<R> for &JustError<E> {
    type Operation = JustErrorOp<R, E>;

    fn connect(self, receiver: R) -> JustErrorOp<R, E> {
        JustErrorOp {
            pending: Some((receiver, self.0.clone())),
        }
    }
}

impl<R: ReceiveStopped> Connect<R> for JustStopped {
    type Operation = JustStoppedOp<R>;

    fn connect(self, receiver: R) -> JustStoppedOp<R> {
        JustStoppedOp {
            receiver: Some(receiver),
        }
    }
}

impl<R: ReceiveStopped> Connect<R> for &JustStopped {
    type Operation = JustStoppedOp<R>;

    fn connect(self, receiver: R) -> JustStoppedOp<R> {
        JustStoppedOp {
            receiver: Some(receiver),
        }
    }
}

impl Sender for Never {
    type Source = Queried;
}

impl<E: Env> QuerySignatures<E> for Never {
    type Answer = Answered<<E::StopToken as StopToken>::WithStopped<Nil>>;
}

/// Operation of [`Never`].
pub struct NeverOp<R: Receiver> {
    receiver: Option<R>,
    callback: Option<<StopTokenOf<R> as StopToken>::Callback>,
}

impl<R> OperationState for NeverOp<R>
where
    R: StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    fn start(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        let token = receiver.env().stop_token();
        self.callback = Some(token.on_stop(move || {
            if receiver.into_stopped().is_err() {
                tracing::error!("stop requested through a token that cannot be stopped");
            }
        }));
    }
}

impl<R> Connect<R> for Never
where
    R: StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    type Operation = NeverOp<R>;

    fn connect(self, receiver: R) -> NeverOp<R> {
        NeverOp {
            receiver: Some(receiver),
            callback: None,
        }
    }
}

impl<R> Connect<R> for &Never
where
    R: StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    type Operation = NeverOp<R>;

    fn connect(self, receiver: R) -> NeverOp<R> {
        Never.connect(receiver)
    }
}
