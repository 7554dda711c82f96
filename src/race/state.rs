use super::policy::Verdict;
use crate::env::{Env, StopEnv, StopTokenOf};
use crate::holder::{BoxedHolder, Deliver};
use crate::stop::{StopSource, StopToken, StoppedVia};
use crate::Receiver;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const NOT_DECIDED: u8 = 0;
const DECIDING: u8 = 1;
const DECIDED: u8 = 2;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared by a race operation and the receivers of its children.
///
/// `outstanding` counts the children that have not completed yet, plus one for an external stop
/// request in flight. Whoever brings it to zero delivers the outcome. It saturates at zero: once
/// it got there, nothing can raise it again.
///
/// Holders are only boxed when they are kept. A completion arriving after the decision is dropped
/// where it stands.
pub(crate) struct RaceState<R: Receiver> {
    decision: AtomicU8,
    outstanding: AtomicUsize,
    arity: usize,
    /// Written once, by whoever moves `decision` from `NOT_DECIDED` to `DECIDING`.
    winner: Mutex<Option<BoxedHolder<R>>>,
    fallback: Mutex<Option<BoxedHolder<R>>>,
    receiver: Mutex<Option<R>>,
    stop_source: StopSource,
    stop_callback: Mutex<Option<<StopTokenOf<R> as StopToken>::Callback>>,
}

/// The outcome of a race stopped from outside.
struct ExternalStop;

impl<R> Deliver<R> for ExternalStop
where
    R: StoppedVia<StopTokenOf<R>>,
{
    fn deliver(self, receiver: R) {
        if receiver.into_stopped().is_err() {
            tracing::error!("stop requested through a token that cannot be stopped");
        }
    }
}

impl<R: Receiver> RaceState<R> {
    pub(crate) fn new(receiver: R, arity: usize) -> Self {
        Self {
            decision: AtomicU8::new(NOT_DECIDED),
            outstanding: AtomicUsize::new(arity),
            arity,
            winner: Mutex::new(None),
            fallback: Mutex::new(None),
            receiver: Mutex::new(Some(receiver)),
            stop_source: StopSource::new(),
            stop_callback: Mutex::new(None),
        }
    }

    /// The environment handed to every child.
    pub(crate) fn child_env(&self) -> StopEnv {
        StopEnv::new(self.stop_source.token())
    }

    pub(crate) fn is_decided(&self) -> bool {
        self.decision.load(Ordering::Acquire) == DECIDED
    }

    /// Records one child's completion according to `verdict`.
    pub(crate) fn complete<H>(&self, verdict: Verdict, holder: H)
    where
        H: Deliver<R> + Send + 'static,
    {
        match verdict {
            Verdict::Decide => {
                self.try_decide(holder);
            }
            Verdict::Remember if !self.is_decided() => {
                let replaced = lock(&self.fallback).replace(Box::new(holder));
                drop(replaced);
            }
            Verdict::RememberIfEmpty if !self.is_decided() => {
                let mut fallback = lock(&self.fallback);
                if fallback.is_none() {
                    *fallback = Some(Box::new(holder));
                }
            }
            Verdict::Remember | Verdict::RememberIfEmpty => drop(holder),
        }
        self.retire();
    }

    /// Stores `holder` as the winner if nothing has won yet, then asks every child to stop.
    ///
    /// The caller must hold a count in `outstanding`, so the outcome cannot be delivered before
    /// the winner is stored.
    fn try_decide<H>(&self, holder: H) -> bool
    where
        H: Deliver<R> + Send + 'static,
    {
        if self
            .decision
            .compare_exchange(NOT_DECIDED, DECIDING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        *lock(&self.winner) = Some(Box::new(holder));
        self.decision.store(DECIDED, Ordering::Release);
        tracing::trace!(children = self.arity, "race decided");
        self.stop_source.request_stop();
        true
    }

    /// Raises `outstanding` by one, unless it already reached zero.
    fn join(&self) -> bool {
        self.outstanding
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n != 0).then(|| n + 1)
            })
            .is_ok()
    }

    fn retire(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finish();
        }
    }

    fn finish(&self) {
        let callback = lock(&self.stop_callback).take();
        drop(callback);
        let winner = lock(&self.winner).take();
        let outcome = winner.or_else(|| lock(&self.fallback).take());
        let Some(receiver) = lock(&self.receiver).take() else {
            tracing::warn!("race already delivered its outcome");
            return;
        };
        match outcome {
            Some(holder) => holder.deliver_boxed(receiver),
            None => tracing::error!(children = self.arity, "race finished without an outcome"),
        }
    }

    fn downstream_token(&self) -> Option<StopTokenOf<R>> {
        lock(&self.receiver)
            .as_ref()
            .map(|receiver| receiver.env().stop_token())
    }
}

impl<R> RaceState<R>
where
    R: Receiver + StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    /// Prepares the start of the race. Returns whether the children should be started.
    ///
    /// If the downstream environment already asks to stop, the race completes with stopped right
    /// away. Otherwise a downstream stop request gets forwarded to the children from now on.
    pub(crate) fn begin(self: &Arc<Self>) -> bool {
        let Some(token) = self.downstream_token() else {
            return false;
        };
        if token.stop_requested() {
            tracing::debug!(children = self.arity, "race stopped before start");
            self.stop_before_start();
            return false;
        }
        if <StopTokenOf<R> as StopToken>::STOPPABLE {
            let state = Arc::downgrade(self);
            let callback = token.on_stop(move || {
                if let Some(state) = state.upgrade() {
                    state.on_external_stop();
                }
            });
            *lock(&self.stop_callback) = Some(callback);
        }
        true
    }

    fn stop_before_start(&self) {
        let Some(receiver) = lock(&self.receiver).take() else {
            return;
        };
        if receiver.into_stopped().is_err() {
            tracing::error!("stop requested through a token that cannot be stopped");
        }
    }

    fn on_external_stop(&self) {
        tracing::debug!(children = self.arity, "race stopped from outside");
        if self.arity == 0 {
            self.try_decide(ExternalStop);
            self.finish();
        } else if self.join() {
            self.try_decide(ExternalStop);
            self.retire();
        }
    }
}
