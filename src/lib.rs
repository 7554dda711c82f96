//! Senders and receivers are a way to describe asynchronous work as values, compose those values,
//! and only later run them, with a static description of every possible way the work can end:
//!
//! - **success**, with a value payload,
//! - **failure**, with an error,
//! - **stopped**, when the work was cooperatively cancelled.
//!
//! Exactly one of these happens, exactly once, for every piece of work that is started.
//!
//! # Senders, receivers, operations
//!
//! A [Sender] describes work that has not started. A [Receiver] is the other side: a set of
//! completion handlers, one per channel ([ReceiveValue], [ReceiveError], [ReceiveStopped]).
//! Each completion method takes the receiver by value, so a receiver can only ever be completed
//! once.
//!
//! Binding the two together is called *connecting*, and produces an [OperationState]. Nothing
//! runs until the operation is [started](OperationState::start).
//!
//! ```
//! use fanin::{connect, just, OperationState};
//! use fanin::testing::ValueSink;
//!
//! let (receiver, values) = ValueSink::<(i32,)>::new();
//! let mut op = connect(just(42), receiver);
//! op.start();
//! assert_eq!(values.take(), vec![(42,)]);
//! ```
//!
//! # Completion signatures
//!
//! Every sender advertises, at the type level, the list of ways it may complete. These are its
//! *completion signatures*, see the [signatures] module. Signatures may depend on the receiver's
//! [environment](env): a sender that only ever stops when asked to does not advertise
//! [SetStopped](signatures::SetStopped) to a receiver whose environment can never ask.
//!
//! [connect] checks statically that the receiver accepts every signature the sender advertises
//! in the receiver's environment. A mismatch is a type error, never a runtime failure.
//!
//! The [gather] module projects signatures into ordinary types, for example the tuple of values a
//! sender produces.
//!
//! # Racing
//!
//! The [race] module connects several senders at once, runs them concurrently, and completes with
//! exactly one of their outcomes:
//!
//! - [when_any] takes whatever finishes first,
//! - [first_successful] takes the first value, and only fails if everything fails,
//! - [stop_when] lets a controller sender cut the others short.
//!
//! ```
//! use fanin::{just, just_error, when_any, first_successful, sync_wait, WaitError};
//!
//! let first = sync_wait::<(i32,), i32, _>(when_any((just(42), just(17))));
//! assert_eq!(first.ok(), Some(Some((42,))));
//!
//! let success = sync_wait::<(i32,), i32, _>(first_successful((just_error(42), just(17))));
//! assert_eq!(success.ok(), Some(Some((17,))));
//! ```
//!
//! Losers are asked to stop through their [stop token](stop), and the combinator only completes
//! once every child has finished, so nothing a loser does can outlive the race.
//!
//! # Single-shot and multi-shot senders
//!
//! Connecting consumes a sender. Senders that can be connected over and over also implement
//! [Connect] for a shared reference to themselves; these are [MultiShotSender]s. A race over
//! multi-shot children is multi-shot itself.
//!
//! # Where the work runs
//!
//! Nothing in this crate spawns threads on its own. The [schedulers] module provides senders that
//! complete on other execution contexts: inline, a fresh thread, a [futures::task::Spawn]
//! executor, or a tokio runtime with the `runtime-tokio` feature.

pub mod adaptors;
pub mod env;
pub mod gather;
pub mod holder;
pub mod just;
pub mod race;
pub mod schedulers;
pub mod signatures;
pub mod stop;
pub mod sync_wait;
pub mod testing;

pub use adaptors::{then, upon_stopped, SenderExt};
pub use just::{just, just_error, just_stopped, never, Just, JustError, JustStopped, Never};
pub use race::{first_successful, stop_when, when_any, WhenAny};
pub use sync_wait::{sync_wait, WaitError};

use env::Env;
use signatures::{CompletionSignaturesOf, Cons, Nil, Resolve, SetError, SetStopped, SetValue};

/// A description of asynchronous work that has not started yet.
pub trait Sender {
    /// How the completion signatures of this sender are resolved: either
    /// [`Declared`](signatures::Declared) or [`Queried`](signatures::Queried).
    type Source;
}

impl<S: Sender + ?Sized> Sender for &S {
    type Source = S::Source;
}

/// The completion side of an operation.
pub trait Receiver {
    type Env: Env;

    fn env(&self) -> Self::Env;
}

/// Receivers accepting a value payload `P`.
pub trait ReceiveValue<P>: Receiver {
    fn set_value(self, values: P);
}

/// Receivers accepting an error of type `E`.
pub trait ReceiveError<E>: Receiver {
    fn set_error(self, error: E);
}

/// Receivers accepting the stopped completion.
pub trait ReceiveStopped: Receiver {
    fn set_stopped(self);
}

/// Receivers accepting every signature in the list `L`.
pub trait ReceiverOf<L>: Receiver {}

impl<R: Receiver> ReceiverOf<Nil> for R {}

impl<R, P, T> ReceiverOf<Cons<SetValue<P>, T>> for R where R: ReceiveValue<P> + ReceiverOf<T> {}

impl<R, E, T> ReceiverOf<Cons<SetError<E>, T>> for R where R: ReceiveError<E> + ReceiverOf<T> {}

impl<R, T> ReceiverOf<Cons<SetStopped, T>> for R where R: ReceiveStopped + ReceiverOf<T> {}

/// Connected work, ready to be started.
pub trait OperationState {
    /// Starts the work. It may complete before this returns. Only the first call has an effect.
    fn start(&mut self);
}

/// Senders that can be connected to receivers of type `R`.
pub trait Connect<R: Receiver>: Sender + Sized {
    type Operation: OperationState;

    fn connect(self, receiver: R) -> Self::Operation;
}

/// The operation state produced by connecting `S` to `R`.
pub type ConnectResult<S, R> = <S as Connect<R>>::Operation;

/// Connects `sender` to `receiver`, checking that the receiver accepts everything the sender may
/// send in the receiver's environment.
pub fn connect<S, R>(sender: S, receiver: R) -> S::Operation
where
    S: Connect<R>,
    R: Receiver,
    R: ReceiverOf<CompletionSignaturesOf<S, <R as Receiver>::Env>>,
    S::Source: Resolve<S, <R as Receiver>::Env>,
{
    sender.connect(receiver)
}

/// Senders that can only be connected once, by value.
///
/// Every connectable sender qualifies; the trait exists to name the concept next to
/// [`MultiShotSender`].
pub trait SingleShotSender<R: Receiver>: Connect<R> {}

impl<S: Connect<R>, R: Receiver> SingleShotSender<R> for S {}

/// Senders that can be connected any number of times through a shared reference.
pub trait MultiShotSender<R: Receiver>: Sender
where
    for<'a> &'a Self: Connect<R>,
{
    /// Connects a shared reference to `self`, leaving the sender usable.
    fn connect_ref<'a>(&'a self, receiver: R) -> <&'a Self as Connect<R>>::Operation {
        Connect::connect(self, receiver)
    }
}

impl<S: Sender, R: Receiver> MultiShotSender<R> for S where for<'a> &'a S: Connect<R> {}
