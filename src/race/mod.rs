//! Racing senders against each other.
//!
//! A race connects every child sender to a receiver of its own, starts them left to right, and
//! completes with exactly one outcome. Which one depends on the [`Policy`]:
//!
//! - [`when_any`]: the first child to complete, however it completes.
//! - [`first_successful`]: the first child to complete with a value. If none does, the last error
//!   seen, or stopped if nobody failed either.
//! - [`stop_when`]: like `when_any`, with an extra controller child whose completion of any kind
//!   counts as stopped.
//!
//! Once the outcome is decided, the remaining children are asked to stop through the stop token
//! in their environment. The race itself completes only after every child has completed, so no
//! child outlives the operation it belongs to.
//!
//! A stop request from the downstream environment is forwarded to the children, and makes the
//! race complete with stopped unless something won before. If stop was requested before the race
//! starts, no child is started at all.
//!
//! ```
//! use fanin::{just, just_stopped, stop_when, sync_wait};
//!
//! let cut_short = sync_wait::<(i32,), std::convert::Infallible, _>(stop_when(just_stopped(), (just(17),)));
//! assert_eq!(cut_short.ok(), Some(None));
//! ```
//!
//! Children are kept in a tuple, up to twelve of them. The signatures of a race are the
//! concatenation of its children's signatures in the environment the race hands them, plus
//! [`SetStopped`](crate::signatures::SetStopped) if the downstream environment may ask to stop.
//! Nothing is deduplicated.
//!
//! No child is favoured when several complete at the same time.

mod child;
mod policy;
mod state;

pub use child::{AsStopped, ChildReceiver, StoppedReceiver};
pub use policy::{AnyCompletion, FirstSuccess, Policy, Verdict};

use crate::env::{Env, StopEnv, StopTokenOf};
use crate::signatures::{
    Answered, CompletionSignaturesOf, Nil, Queried, QuerySignatures, Resolve, SigList,
};
use crate::stop::{StopToken, StoppedVia};
use crate::{Connect, OperationState, Receiver, Sender};
use state::RaceState;
use std::marker::PhantomData;
use std::sync::Arc;

/// Races the senders in the tuple `C` under policy `Pol`.
pub struct WhenAny<C, Pol = AnyCompletion> {
    children: C,
    _policy: PhantomData<fn() -> Pol>,
}

impl<C, Pol> WhenAny<C, Pol> {
    fn new(children: C) -> Self {
        Self {
            children,
            _policy: PhantomData,
        }
    }

    pub fn into_children(self) -> C {
        self.children
    }
}

impl<C: Clone, Pol> Clone for WhenAny<C, Pol> {
    fn clone(&self) -> Self {
        Self::new(self.children.clone())
    }
}

crate::adaptors::pipeable!(WhenAny<C, Pol>);

/// Completes with whichever child completes first.
///
/// With no children at all, the race never completes unless stopped from outside.
pub fn when_any<C>(children: C) -> WhenAny<C, AnyCompletion> {
    WhenAny::new(children)
}

/// Completes with the first value any child produces.
pub fn first_successful<C>(children: C) -> WhenAny<C, FirstSuccess> {
    WhenAny::new(children)
}

/// Tuples of children that a controller can be put in front of.
pub trait WithController<Ctl> {
    type Output;

    fn with_controller(self, controller: Ctl) -> Self::Output;
}

/// The sender returned by [`stop_when`].
pub type StopWhen<Ctl, C> = WhenAny<<C as WithController<Ctl>>::Output, AnyCompletion>;

/// Races `children` like [`when_any`], and completes with stopped as soon as `controller`
/// completes, whatever it completes with. The controller is started first.
pub fn stop_when<Ctl, C>(controller: Ctl, children: C) -> StopWhen<Ctl, C>
where
    C: WithController<Ctl>,
{
    WhenAny::new(children.with_controller(controller))
}

/// The operation of a [`WhenAny`].
pub struct RaceOp<R: Receiver, Ops> {
    state: Arc<RaceState<R>>,
    children: Ops,
    started: bool,
}

impl<R: Receiver, Ops> RaceOp<R, Ops> {
    fn new(state: Arc<RaceState<R>>, children: Ops) -> Self {
        Self {
            state,
            children,
            started: false,
        }
    }
}

/// The concatenation of a comma-separated list of signature lists.
macro_rules! concat_sigs {
    () => { Nil };
    ($head:ty $(, $tail:ty)*) => {
        <$head as SigList>::Concat<concat_sigs!($($tail),*)>
    };
}

macro_rules! impl_race {
    ($arity:literal; $($S:ident $idx:tt),*) => {
        impl<Pol, $($S),*> Sender for WhenAny<($($S,)*), Pol> {
            type Source = Queried;
        }

        impl<Pol, E: Env, $($S),*> QuerySignatures<E> for WhenAny<($($S,)*), Pol>
        where
            $($S: Sender, $S::Source: Resolve<$S, StopEnv>,)*
        {
            type Answer = Answered<<E::StopToken as StopToken>::WithStopped<
                concat_sigs!($(CompletionSignaturesOf<$S, StopEnv>),*)
            >>;
        }

        impl<R, Pol, $($S),*> Connect<R> for WhenAny<($($S,)*), Pol>
        where
            R: Receiver + StoppedVia<StopTokenOf<R>> + Send + 'static,
            Pol: Policy,
            $($S: Connect<ChildReceiver<R, Pol>>,)*
        {
            type Operation =
                RaceOp<R, ($(<$S as Connect<ChildReceiver<R, Pol>>>::Operation,)*)>;

            #[allow(unused_variables)]
            fn connect(self, receiver: R) -> Self::Operation {
                let state = Arc::new(RaceState::new(receiver, $arity));
                let children = ($(self.children.$idx.connect(ChildReceiver::new(&state)),)*);
                RaceOp::new(state, children)
            }
        }

        impl<'a, R, Pol, $($S),*> Connect<R> for &'a WhenAny<($($S,)*), Pol>
        where
            R: Receiver + StoppedVia<StopTokenOf<R>> + Send + 'static,
            Pol: Policy,
            $(&'a $S: Connect<ChildReceiver<R, Pol>>,)*
        {
            type Operation =
                RaceOp<R, ($(<&'a $S as Connect<ChildReceiver<R, Pol>>>::Operation,)*)>;

            #[allow(unused_variables)]
            fn connect(self, receiver: R) -> Self::Operation {
                let state = Arc::new(RaceState::new(receiver, $arity));
                let children = ($((&self.children.$idx).connect(ChildReceiver::new(&state)),)*);
                RaceOp::new(state, children)
            }
        }

        impl<R, $($S),*> OperationState for RaceOp<R, ($($S,)*)>
        where
            R: Receiver + StoppedVia<StopTokenOf<R>> + Send + 'static,
            $($S: OperationState,)*
        {
            fn start(&mut self) {
                if std::mem::replace(&mut self.started, true) {
                    return;
                }
                if !self.state.begin() {
                    return;
                }
                $(self.children.$idx.start();)*
            }
        }
    };
}

macro_rules! impl_controller {
    ($($S:ident $idx:tt),*) => {
        impl<Ctl, $($S),*> WithController<Ctl> for ($($S,)*) {
            type Output = (AsStopped<Ctl>, $($S,)*);

            #[allow(clippy::unused_unit)]
            fn with_controller(self, controller: Ctl) -> Self::Output {
                (AsStopped(controller), $(self.$idx,)*)
            }
        }
    };
}

impl_race!(0;);
impl_race!(1; S0 0);
impl_race!(2; S0 0, S1 1);
impl_race!(3; S0 0, S1 1, S2 2);
impl_race!(4; S0 0, S1 1, S2 2, S3 3);
impl_race!(5; S0 0, S1 1, S2 2, S3 3, S4 4);
impl_race!(6; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5);
impl_race!(7; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6);
impl_race!(8; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7);
impl_race!(9; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8);
impl_race!(10; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8, S9 9);
impl_race!(11; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8, S9 9, S10 10);
impl_race!(12; S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8, S9 9, S10 10, S11 11);

impl_controller!();
impl_controller!(S0 0);
impl_controller!(S0 0, S1 1);
impl_controller!(S0 0, S1 1, S2 2);
impl_controller!(S0 0, S1 1, S2 2, S3 3);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8, S9 9);
impl_controller!(S0 0, S1 1, S2 2, S3 3, S4 4, S5 5, S6 6, S7 7, S8 8, S9 9, S10 10);
