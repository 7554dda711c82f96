//! Running a sender to completion from synchronous or `async` code.
//!
//! The caller names the value payload `V` and the error type `E` it expects; the sender must be
//! connectable to a receiver accepting exactly those, plus stopped. Stopped is reported as
//! `Ok(None)`.

use crate::env::EmptyEnv;
use crate::holder::Completion;
use crate::signatures::{CompletionSignaturesOf, Resolve};
use crate::{
    Connect, OperationState, ReceiveError, ReceiveStopped, ReceiveValue, Receiver, ReceiverOf,
};
use futures::channel::oneshot;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Why [`sync_wait`] did not produce a value.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<E> {
    #[error("sender completed with an error")]
    Failed(E),
    #[error("sender was dropped without completing")]
    Abandoned,
}

/// Receiver used by [`sync_wait`] and [`SenderFuture`].
pub struct SyncWaitReceiver<V, E> {
    sender: oneshot::Sender<Completion<V, E>>,
}

type Outcome<V, E> = oneshot::Receiver<Completion<V, E>>;

impl<V, E> SyncWaitReceiver<V, E> {
    fn new() -> (Self, Outcome<V, E>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    fn send(self, completion: Completion<V, E>) {
        if self.sender.send(completion).is_err() {
            tracing::debug!("completion arrived after the waiter went away");
        }
    }
}

impl<V, E> Receiver for SyncWaitReceiver<V, E> {
    type Env = EmptyEnv;

    fn env(&self) -> EmptyEnv {
        EmptyEnv
    }
}

impl<V, E> ReceiveValue<V> for SyncWaitReceiver<V, E> {
    fn set_value(self, values: V) {
        self.send(Completion::Value(values))
    }
}

impl<V, E> ReceiveError<E> for SyncWaitReceiver<V, E> {
    fn set_error(self, error: E) {
        self.send(Completion::Error(error))
    }
}

impl<V, E> ReceiveStopped for SyncWaitReceiver<V, E> {
    fn set_stopped(self) {
        self.send(Completion::Stopped)
    }
}

fn into_result<V, E>(
    received: Result<Completion<V, E>, oneshot::Canceled>,
) -> Result<Option<V>, WaitError<E>> {
    match received {
        Ok(Completion::Value(values)) => Ok(Some(values)),
        Ok(Completion::Error(error)) => Err(WaitError::Failed(error)),
        Ok(Completion::Stopped) => Ok(None),
        Err(oneshot::Canceled) => Err(WaitError::Abandoned),
    }
}

/// Connects `sender`, starts it, and blocks the current thread until it completes.
///
/// ```
/// use fanin::{just_error, sync_wait, WaitError};
///
/// let failed = sync_wait::<(), &str, _>(just_error("no"));
/// assert!(matches!(failed, Err(WaitError::Failed("no"))));
/// ```
pub fn sync_wait<V, E, S>(sender: S) -> Result<Option<V>, WaitError<E>>
where
    S: Connect<SyncWaitReceiver<V, E>>,
    S::Source: Resolve<S, EmptyEnv>,
    SyncWaitReceiver<V, E>: ReceiverOf<CompletionSignaturesOf<S, EmptyEnv>>,
{
    let (receiver, outcome) = SyncWaitReceiver::<V, E>::new();
    let mut operation = sender.connect(receiver);
    operation.start();
    let received = futures::executor::block_on(outcome);
    drop(operation);
    into_result(received)
}

/// A sender driven as a [`Future`]. Created by [`SenderExt::into_future`](crate::SenderExt::into_future).
///
/// The sender is connected and started on first poll, and the operation is kept alive until the
/// future is dropped.
pub struct SenderFuture<S: Connect<SyncWaitReceiver<V, E>>, V, E> {
    sender: Option<S>,
    running: Option<(S::Operation, Outcome<V, E>)>,
}

impl<S: Connect<SyncWaitReceiver<V, E>>, V, E> SenderFuture<S, V, E> {
    pub(crate) fn new(sender: S) -> Self {
        Self {
            sender: Some(sender),
            running: None,
        }
    }
}

// Operation states here never rely on their own address.
impl<S: Connect<SyncWaitReceiver<V, E>>, V, E> Unpin for SenderFuture<S, V, E> {}

impl<S: Connect<SyncWaitReceiver<V, E>>, V, E> Future for SenderFuture<S, V, E> {
    type Output = Result<Option<V>, WaitError<E>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        if let Some(sender) = this.sender.take() {
            let (receiver, outcome) = SyncWaitReceiver::new();
            let mut operation = sender.connect(receiver);
            operation.start();
            this.running = Some((operation, outcome));
        }
        match &mut this.running {
            Some((_, outcome)) => outcome.poll_unpin(cx).map(into_result),
            None => Poll::Ready(Err(WaitError::Abandoned)),
        }
    }
}
