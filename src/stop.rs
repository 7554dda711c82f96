//! Cooperative cancellation.
//!
//! A [`StopSource`] requests stop; the [`InplaceStopToken`]s derived from it observe the request
//! and run registered callbacks when it happens. [`NeverStopToken`] is the token of environments
//! that cannot be stopped, and lets the type system know it.
//!
//! Stopping is only a request. Work observing a token exits at its own pace, and work ignoring
//! its token is never interrupted.

use crate::signatures::{Cons, Nil, SetStopped, SigList};
use crate::{ReceiveStopped, Receiver};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Observes stop requests.
pub trait StopToken: Clone + Send + Sync + 'static {
    /// Whether a token of this type can ever report a stop request.
    const STOPPABLE: bool;

    /// Registration handle returned by [`on_stop`](Self::on_stop); dropping it deregisters.
    type Callback: Send;

    /// `L`, with [`SetStopped`] appended if this token can be stopped.
    type WithStopped<L: SigList>: SigList;

    fn stop_requested(&self) -> bool;

    /// Registers `f` to run once stop is requested. If stop has already been requested, `f` runs
    /// before this returns.
    fn on_stop<F>(&self, f: F) -> Self::Callback
    where
        F: FnOnce() + Send + 'static;
}

/// A token that is never stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverStopToken;

impl StopToken for NeverStopToken {
    const STOPPABLE: bool = false;
    type Callback = ();
    type WithStopped<L: SigList> = L;

    fn stop_requested(&self) -> bool {
        false
    }

    fn on_stop<F>(&self, _f: F) -> Self::Callback
    where
        F: FnOnce() + Send + 'static,
    {
    }
}

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    pending: Vec<(u64, Callback)>,
}

#[derive(Default)]
struct Inner {
    stopped: AtomicBool,
    registry: Mutex<Registry>,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of a stop state; requests stop on every token derived from it.
#[derive(Default)]
pub struct StopSource {
    inner: Arc<Inner>,
}

/// Token derived from a [`StopSource`].
#[derive(Clone)]
pub struct InplaceStopToken {
    inner: Arc<Inner>,
}

/// Registration of a stop callback. Dropping it removes the callback if it has not run yet.
///
/// A callback that is already running when its registration is dropped is not waited for.
#[must_use]
pub struct StopCallback {
    inner: Weak<Inner>,
    id: Option<u64>,
}

impl StopSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> InplaceStopToken {
        InplaceStopToken {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn stop_requested(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    /// Requests stop and runs the registered callbacks on the calling thread.
    ///
    /// Returns `false` if stop had already been requested, in which case nothing runs.
    pub fn request_stop(&self) -> bool {
        if self.inner.stopped.swap(true, Ordering::AcqRel) {
            return false;
        }
        let pending = std::mem::take(&mut self.inner.registry().pending);
        tracing::debug!(callbacks = pending.len(), "stop requested");
        for (_, callback) in pending {
            callback();
        }
        true
    }
}

impl fmt::Debug for StopSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StopSource")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

impl fmt::Debug for InplaceStopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InplaceStopToken")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

impl StopToken for InplaceStopToken {
    const STOPPABLE: bool = true;
    type Callback = StopCallback;
    type WithStopped<L: SigList> = L::Concat<Cons<SetStopped, Nil>>;

    fn stop_requested(&self) -> bool {
        self.inner.stopped.load(Ordering::Acquire)
    }

    fn on_stop<F>(&self, f: F) -> StopCallback
    where
        F: FnOnce() + Send + 'static,
    {
        let mut registry = self.inner.registry();
        // Checked under the lock: `request_stop` flips the flag before draining the registry.
        if self.inner.stopped.load(Ordering::Acquire) {
            drop(registry);
            f();
            return StopCallback {
                inner: Weak::new(),
                id: None,
            };
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.pending.push((id, Box::new(f)));
        StopCallback {
            inner: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }
}

impl Drop for StopCallback {
    fn drop(&mut self) {
        let (Some(id), Some(inner)) = (self.id, self.inner.upgrade()) else {
            return;
        };
        let removed = {
            let mut registry = inner.registry();
            let index = registry.pending.iter().position(|(pending, _)| *pending == id);
            index.map(|index| registry.pending.swap_remove(index))
        };
        // Dropped outside the lock, the callback may own receivers with their own drop logic.
        drop(removed);
    }
}

/// Receivers that can be told to stop whenever a token of type `T` asks them to.
///
/// Every receiver qualifies for [`NeverStopToken`], since it never asks. Only receivers accepting
/// `set_stopped` qualify for [`InplaceStopToken`]. Senders that react to their stop token bound on
/// this instead of [`ReceiveStopped`], so they stay connectable to receivers without a stopped
/// channel when the environment cannot be stopped anyway.
pub trait StoppedVia<T: StopToken>: Receiver + Sized {
    /// Completes with `set_stopped` if `token` reports a stop request, otherwise hands `self` back.
    fn stop_if_requested(self, token: &T) -> Option<Self>;

    /// Completes with `set_stopped`, or hands `self` back if tokens of type `T` can never stop.
    fn into_stopped(self) -> Result<(), Self>;
}

impl<R: Receiver> StoppedVia<NeverStopToken> for R {
    fn stop_if_requested(self, _token: &NeverStopToken) -> Option<Self> {
        Some(self)
    }

    fn into_stopped(self) -> Result<(), Self> {
        Err(self)
    }
}

impl<R: ReceiveStopped> StoppedVia<InplaceStopToken> for R {
    fn stop_if_requested(self, token: &InplaceStopToken) -> Option<Self> {
        if token.stop_requested() {
            self.set_stopped();
            None
        } else {
            Some(self)
        }
    }

    fn into_stopped(self) -> Result<(), Self> {
        self.set_stopped();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn callbacks_run_once_on_request() {
        let source = StopSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let _callback = source.token().on_stop(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!source.token().stop_requested());
        assert!(source.request_stop());
        assert!(!source.request_stop());
        assert!(source.token().stop_requested());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn registering_after_stop_runs_inline() {
        let source = StopSource::new();
        source.request_stop();

        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let _callback = source.token().on_stop(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_registration_never_runs() {
        let source = StopSource::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        let callback = source.token().on_stop(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        drop(callback);

        source.request_stop();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn registration_may_outlive_source() {
        let source = StopSource::new();
        let callback = source.token().on_stop(|| {});
        drop(source);
        drop(callback);
    }

    #[test]
    fn never_token_ignores_callbacks() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&hits);
        NeverStopToken.on_stop(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!NeverStopToken.stop_requested());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
