use super::policy::Policy;
use super::state::RaceState;
use crate::env::StopEnv;
use crate::holder::{ErrorHolder, StoppedHolder, ValueHolder};
use crate::signatures::{Cons, Declared, DeclaredSignatures, Nil, SetStopped};
use crate::{Connect, ReceiveError, ReceiveStopped, ReceiveValue, Receiver, Sender};
use std::marker::PhantomData;
use std::sync::Arc;

/// Receiver connected to each child of a race.
///
/// Its environment carries the race's own stop token, so every child can be asked to stop once
/// the race is decided, whatever the downstream environment looks like.
pub struct ChildReceiver<R: Receiver, Pol> {
    state: Arc<RaceState<R>>,
    _policy: PhantomData<fn() -> Pol>,
}

impl<R: Receiver, Pol> ChildReceiver<R, Pol> {
    pub(crate) fn new(state: &Arc<RaceState<R>>) -> Self {
        Self {
            state: Arc::clone(state),
            _policy: PhantomData,
        }
    }
}

impl<R: Receiver, Pol> Receiver for ChildReceiver<R, Pol> {
    type Env = StopEnv;

    fn env(&self) -> StopEnv {
        self.state.child_env()
    }
}

impl<R, Pol, P> ReceiveValue<P> for ChildReceiver<R, Pol>
where
    R: ReceiveValue<P> + Send + 'static,
    P: Send + 'static,
    Pol: Policy,
{
    fn set_value(self, values: P) {
        self.state.complete(Pol::ON_VALUE, ValueHolder(values))
    }
}

impl<R, Pol, E> ReceiveError<E> for ChildReceiver<R, Pol>
where
    R: ReceiveError<E> + Send + 'static,
    E: Send + 'static,
    Pol: Policy,
{
    fn set_error(self, error: E) {
        self.state.complete(Pol::ON_ERROR, ErrorHolder(error))
    }
}

impl<R, Pol> ReceiveStopped for ChildReceiver<R, Pol>
where
    R: ReceiveStopped + Send + 'static,
    Pol: Policy,
{
    fn set_stopped(self) {
        self.state.complete(Pol::ON_STOPPED, StoppedHolder)
    }
}

/// A controller sender for [`stop_when`](super::stop_when): whatever it completes with is turned
/// into `set_stopped`.
pub struct AsStopped<C>(pub(crate) C);

impl<C> Sender for AsStopped<C> {
    type Source = Declared;
}

impl<C> DeclaredSignatures for AsStopped<C> {
    type Signatures = Cons<SetStopped, Nil>;
}

/// Receiver completing `R` with `set_stopped`, whatever it is given.
pub struct StoppedReceiver<R>(R);

impl<R: Receiver> Receiver for StoppedReceiver<R> {
    type Env = R::Env;

    fn env(&self) -> R::Env {
        self.0.env()
    }
}

impl<R: ReceiveStopped, P> ReceiveValue<P> for StoppedReceiver<R> {
    fn set_value(self, _values: P) {
        self.0.set_stopped()
    }
}

impl<R: ReceiveStopped, E> ReceiveError<E> for StoppedReceiver<R> {
    fn set_error(self, _error: E) {
        self.0.set_stopped()
    }
}

impl<R: ReceiveStopped> ReceiveStopped for StoppedReceiver<R> {
    fn set_stopped(self) {
        self.0.set_stopped()
    }
}

impl<C, R> Connect<R> for AsStopped<C>
where
    R: ReceiveStopped,
    C: Connect<StoppedReceiver<R>>,
{
    type Operation = C::Operation;

    fn connect(self, receiver: R) -> C::Operation {
        self.0.connect(StoppedReceiver(receiver))
    }
}

impl<'a, C, R> Connect<R> for &'a AsStopped<C>
where
    R: ReceiveStopped,
    &'a C: Connect<StoppedReceiver<R>>,
{
    type Operation = <&'a C as Connect<StoppedReceiver<R>>>::Operation;

    fn connect(self, receiver: R) -> Self::Operation {
        (&self.0).connect(StoppedReceiver(receiver))
    }
}
