//! Receivers that record what they are given, for tests and examples.
//!
//! ```
//! use fanin::{connect, just_error, OperationState};
//! use fanin::holder::Completion;
//! use fanin::testing::Recorder;
//!
//! let (receiver, recording) = Recorder::<(i32,), &str>::new();
//! connect(just_error("boom"), receiver).start();
//! assert_eq!(recording.take(), vec![Completion::Error("boom")]);
//! ```

use crate::env::{EmptyEnv, Env, StopEnv};
use crate::holder::Completion;
use crate::stop::StopSource;
use crate::{ReceiveError, ReceiveStopped, ReceiveValue, Receiver};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct Log<T> {
    items: Mutex<Vec<T>>,
    changed: Condvar,
}

impl<T> Log<T> {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            items: Mutex::new(Vec::new()),
            changed: Condvar::new(),
        })
    }

    fn items(&self) -> MutexGuard<'_, Vec<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, item: T) {
        self.items().push(item);
        self.changed.notify_all();
    }

    fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut items = self.items();
        while items.len() < count {
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            items = self
                .changed
                .wait_timeout(items, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

/// Receiver accepting only values of type `V`, in an environment that never stops.
pub struct ValueSink<V> {
    log: Arc<Log<V>>,
}

/// The values a [`ValueSink`] has received so far.
pub struct Values<V> {
    log: Arc<Log<V>>,
}

impl<V> ValueSink<V> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, Values<V>) {
        let log = Log::new();
        (
            Self {
                log: Arc::clone(&log),
            },
            Values { log },
        )
    }
}

impl<V> Values<V> {
    pub fn take(&self) -> Vec<V> {
        std::mem::take(&mut *self.log.items())
    }

    pub fn len(&self) -> usize {
        self.log.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks until at least `count` values arrived, or `timeout` passed. Returns which one it was.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        self.log.wait_for(count, timeout)
    }
}

impl<V> Receiver for ValueSink<V> {
    type Env = EmptyEnv;

    fn env(&self) -> EmptyEnv {
        EmptyEnv
    }
}

impl<V> ReceiveValue<V> for ValueSink<V> {
    fn set_value(self, values: V) {
        self.log.push(values)
    }
}

/// Receiver accepting value payload `V`, error `E` and stopped, in environment `X`.
pub struct Recorder<V, E, X = EmptyEnv> {
    log: Arc<Log<Completion<V, E>>>,
    env: X,
}

/// The completions a [`Recorder`] has received so far.
pub struct Recording<V, E> {
    log: Arc<Log<Completion<V, E>>>,
}

impl<V, E> Recorder<V, E> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, Recording<V, E>) {
        Self::with_env(EmptyEnv)
    }

    /// A recorder whose environment carries a token of the returned source.
    pub fn stoppable() -> (Recorder<V, E, StopEnv>, Recording<V, E>, StopSource) {
        let source = StopSource::new();
        let (recorder, recording) = Recorder::with_env(StopEnv::new(source.token()));
        (recorder, recording, source)
    }
}

impl<V, E, X: Env> Recorder<V, E, X> {
    pub fn with_env(env: X) -> (Self, Recording<V, E>) {
        let log = Log::new();
        (
            Self {
                log: Arc::clone(&log),
                env,
            },
            Recording { log },
        )
    }
}

impl<V, E> Recording<V, E> {
    pub fn take(&self) -> Vec<Completion<V, E>> {
        std::mem::take(&mut *self.log.items())
    }

    pub fn len(&self) -> usize {
        self.log.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks until at least `count` completions arrived, or `timeout` passed. Returns which one
    /// it was.
    pub fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        self.log.wait_for(count, timeout)
    }
}

impl<V, E, X: Env> Receiver for Recorder<V, E, X> {
    type Env = X;

    fn env(&self) -> X {
        self.env.clone()
    }
}

impl<V, E, X: Env> ReceiveValue<V> for Recorder<V, E, X> {
    fn set_value(self, values: V) {
        self.log.push(Completion::Value(values))
    }
}

impl<V, E, X: Env> ReceiveError<E> for Recorder<V, E, X> {
    fn set_error(self, error: E) {
        self.log.push(Completion::Error(error))
    }
}

impl<V, E, X: Env> ReceiveStopped for Recorder<V, E, X> {
    fn set_stopped(self) {
        self.log.push(Completion::Stopped)
    }
}
