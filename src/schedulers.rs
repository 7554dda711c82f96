//! Execution contexts, as senders.
//!
//! A scheduler hands out *schedule senders*. Each completes with `set_value(())` on the scheduler's
//! execution context, so that whatever is connected after it runs there as well. When the
//! environment asks to stop before the work got its turn, it completes with `set_stopped` instead.
//!
//! - [`InlineScheduler`] completes right away, on the thread that starts it.
//! - [`ThreadScheduler`] spawns a fresh thread per operation.
//! - [`SpawnScheduler`] runs on any [`futures::task::Spawn`] executor, such as
//!   [`futures::executor::ThreadPool`].
//! - [`TokioScheduler`] runs on a tokio runtime, with the `runtime-tokio` feature.

use crate::env::{Env, StopTokenOf};
use crate::just::Just;
use crate::signatures::{Answered, Queried, QuerySignatures, SetError, SetValue};
use crate::stop::{StopToken, StoppedVia};
use crate::{Connect, OperationState, ReceiveError, ReceiveValue, Sender};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Something that hands out senders completing on its execution context.
pub trait Scheduler {
    type Schedule: Sender;

    fn schedule(&self) -> Self::Schedule;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A receiver waiting to be completed on another execution context.
///
/// Shared between the starting side and the scheduled work, so that whichever side ends up
/// responsible can complete it: the work if it runs, the starter if it could not be scheduled.
struct Handoff<R>(Arc<Mutex<Option<R>>>);

impl<R> Handoff<R> {
    fn new(receiver: R) -> (Self, Self) {
        let slot = Arc::new(Mutex::new(Some(receiver)));
        (Self(Arc::clone(&slot)), Self(slot))
    }

    fn take(&self) -> Option<R> {
        lock(&self.0).take()
    }
}

impl<R> Handoff<R>
where
    R: ReceiveValue<()> + StoppedVia<StopTokenOf<R>>,
{
    /// Completes the receiver from the scheduled context.
    fn run(&self) {
        let Some(receiver) = self.take() else {
            return;
        };
        let token = receiver.env().stop_token();
        if let Some(receiver) = receiver.stop_if_requested(&token) {
            receiver.set_value(())
        }
    }

    /// Completes the receiver from the scheduled context after `delay`, or earlier with
    /// `set_stopped` if stop is requested in the meantime.
    fn run_after(&self, delay: Duration) {
        let token = match &*lock(&self.0) {
            Some(receiver) => receiver.env().stop_token(),
            None => return,
        };
        let (wake, woken) = std::sync::mpsc::channel::<()>();
        let _keep_open = wake.clone();
        let _callback = token.on_stop(move || {
            let _ = wake.send(());
        });
        if woken.recv_timeout(delay).is_ok() {
            tracing::trace!("timer cut short by stop request");
        }
        self.run();
    }
}

/// Completes inline, on the thread that starts the operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    type Schedule = Just<()>;

    fn schedule(&self) -> Just<()> {
        Just::from(())
    }
}

/// Runs every operation on a new OS thread.
///
/// ```
/// use fanin::schedulers::{Scheduler, ThreadScheduler};
/// use fanin::{sync_wait, then};
///
/// let scheduler = ThreadScheduler::new().name("worker");
/// let name = scheduler.schedule() | then(|()| (std::thread::current().name().map(String::from),));
/// let name = sync_wait::<(Option<String>,), std::io::Error, _>(name).unwrap();
/// assert_eq!(name, Some((Some("worker".to_owned()),)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ThreadScheduler {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names the spawned threads.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the stack size of the spawned threads, in bytes.
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Like [`schedule`](Scheduler::schedule), but completes only after `delay` has passed on the
    /// new thread. A stop request cuts the wait short.
    pub fn schedule_after(&self, delay: Duration) -> ThreadSchedule {
        ThreadSchedule {
            scheduler: self.clone(),
            delay: Some(delay),
        }
    }

    fn builder(&self) -> std::thread::Builder {
        let mut builder = std::thread::Builder::new();
        if let Some(name) = &self.name {
            builder = builder.name(name.clone());
        }
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        builder
    }
}

impl Scheduler for ThreadScheduler {
    type Schedule = ThreadSchedule;

    fn schedule(&self) -> ThreadSchedule {
        ThreadSchedule {
            scheduler: self.clone(),
            delay: None,
        }
    }
}

/// Schedule sender of [`ThreadScheduler`].
#[derive(Debug, Clone)]
pub struct ThreadSchedule {
    scheduler: ThreadScheduler,
    delay: Option<Duration>,
}

crate::adaptors::pipeable!(ThreadSchedule);

impl Sender for ThreadSchedule {
    type Source = Queried;
}

impl<E: Env> QuerySignatures<E> for ThreadSchedule {
    type Answer = Answered<
        <E::StopToken as StopToken>::WithStopped<crate::sigs![SetValue<()>, SetError<io::Error>]>,
    >;
}

/// Operation of [`ThreadSchedule`].
pub struct ThreadOp<R> {
    schedule: ThreadSchedule,
    receiver: Option<R>,
}

impl<R> OperationState for ThreadOp<R>
where
    R: ReceiveValue<()> + ReceiveError<io::Error> + StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    fn start(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        let (handoff, fallback) = Handoff::new(receiver);
        let delay = self.schedule.delay;
        let spawned = self.schedule.scheduler.builder().spawn(move || match delay {
            Some(delay) => handoff.run_after(delay),
            None => handoff.run(),
        });
        if let Err(error) = spawned {
            tracing::warn!(%error, "failed to spawn scheduler thread");
            if let Some(receiver) = fallback.take() {
                receiver.set_error(error)
            }
        }
    }
}

impl<R> Connect<R> for ThreadSchedule
where
    R: ReceiveValue<()> + ReceiveError<io::Error> + StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    type Operation = ThreadOp<R>;

    fn connect(self, receiver: R) -> ThreadOp<R> {
        ThreadOp {
            schedule: self,
            receiver: Some(receiver),
        }
    }
}

impl<R> Connect<R> for &ThreadSchedule
where
    R: ReceiveValue<()> + ReceiveError<io::Error> + StoppedVia<StopTokenOf<R>> + Send + 'static,
{
    type Operation = ThreadOp<R>;

    fn connect(self, receiver: R) -> ThreadOp<R> {
        self.clone().connect(receiver)
    }
}

/// Runs every operation as a task of a [`futures::task::Spawn`] executor.
#[derive(Debug, Clone)]
pub struct SpawnScheduler<Sp> {
    spawner: Sp,
}

impl<Sp: futures::task::Spawn + Clone> SpawnScheduler<Sp> {
    pub fn new(spawner: Sp) -> Self {
        Self { spawner }
    }
}

impl<Sp: futures::task::Spawn + Clone> Scheduler for SpawnScheduler<Sp> {
    type Schedule = SpawnSchedule<Sp>;

    fn schedule(&self) -> SpawnSchedule<Sp> {
        SpawnSchedule {
            spawner: self.spawner.clone(),
        }
    }
}

/// Schedule sender of [`SpawnScheduler`].
#[derive(Debug, Clone)]
pub struct SpawnSchedule<Sp> {
    spawner: Sp,
}

crate::adaptors::pipeable!(SpawnSchedule<Sp>);

impl<Sp> Sender for SpawnSchedule<Sp> {
    type Source = Queried;
}

impl<Sp, E: Env> QuerySignatures<E> for SpawnSchedule<Sp> {
    type Answer = Answered<
        <E::StopToken as StopToken>::WithStopped<
            crate::sigs![SetValue<()>, SetError<futures::task::SpawnError>],
        >,
    >;
}

/// Operation of [`SpawnSchedule`].
pub struct SpawnOp<Sp, R> {
    spawner: Sp,
    receiver: Option<R>,
}

impl<Sp, R> OperationState for SpawnOp<Sp, R>
where
    Sp: futures::task::Spawn,
    R: ReceiveValue<()>
        + ReceiveError<futures::task::SpawnError>
        + StoppedVia<StopTokenOf<R>>
        + Send
        + 'static,
{
    fn start(&mut self) {
        use futures::task::SpawnExt;

        let Some(receiver) = self.receiver.take() else {
            return;
        };
        let (handoff, fallback) = Handoff::new(receiver);
        if let Err(error) = self.spawner.spawn(async move { handoff.run() }) {
            tracing::warn!(%error, "failed to spawn scheduler task");
            if let Some(receiver) = fallback.take() {
                receiver.set_error(error)
            }
        }
    }
}

impl<Sp, R> Connect<R> for SpawnSchedule<Sp>
where
    Sp: futures::task::Spawn,
    R: ReceiveValue<()>
        + ReceiveError<futures::task::SpawnError>
        + StoppedVia<StopTokenOf<R>>
        + Send
        + 'static,
{
    type Operation = SpawnOp<Sp, R>;

    fn connect(self, receiver: R) -> SpawnOp<Sp, R> {
        SpawnOp {
            spawner: self.spawner,
            receiver: Some(receiver),
        }
    }
}

impl<Sp, R> Connect<R> for &SpawnSchedule<Sp>
where
    Sp: futures::task::Spawn + Clone,
    R: ReceiveValue<()>
        + ReceiveError<futures::task::SpawnError>
        + StoppedVia<StopTokenOf<R>>
        + Send
        + 'static,
{
    type Operation = SpawnOp<Sp, R>;

    fn connect(self, receiver: R) -> SpawnOp<Sp, R> {
        self.clone().connect(receiver)
    }
}

#[cfg(feature = "runtime-tokio")]
pub use self::tokio::{TokioOp, TokioSchedule, TokioScheduler};

#[cfg(feature = "runtime-tokio")]
mod tokio {
    use super::{Handoff, Scheduler};
    use crate::env::{Env, StopTokenOf};
    use crate::signatures::{Answered, Queried, QuerySignatures, SetValue};
    use crate::stop::{StopToken, StoppedVia};
    use crate::{Connect, OperationState, ReceiveValue, Sender};
    use ::tokio::runtime::{Handle, TryCurrentError};

    /// Runs every operation as a task on a tokio runtime.
    #[derive(Debug, Clone)]
    pub struct TokioScheduler {
        handle: Handle,
    }

    impl TokioScheduler {
        /// The runtime the calling code runs in.
        pub fn current() -> Result<Self, TryCurrentError> {
            Handle::try_current().map(Self::from_handle)
        }

        pub fn from_handle(handle: Handle) -> Self {
            Self { handle }
        }
    }

    impl Scheduler for TokioScheduler {
        type Schedule = TokioSchedule;

        fn schedule(&self) -> TokioSchedule {
            TokioSchedule {
                handle: self.handle.clone(),
            }
        }
    }

    /// Schedule sender of [`TokioScheduler`].
    #[derive(Debug, Clone)]
    pub struct TokioSchedule {
        handle: Handle,
    }

    crate::adaptors::pipeable!(TokioSchedule);

    impl Sender for TokioSchedule {
        type Source = Queried;
    }

    impl<E: Env> QuerySignatures<E> for TokioSchedule {
        type Answer = Answered<<E::StopToken as StopToken>::WithStopped<crate::sigs![SetValue<()>]>>;
    }

    /// The receiver of a spawned task. If the runtime drops the task before it ran, the receiver
    /// completes with stopped.
    struct Task<R>(Handoff<R>)
    where
        R: ReceiveValue<()> + StoppedVia<StopTokenOf<R>>;

    impl<R> Drop for Task<R>
    where
        R: ReceiveValue<()> + StoppedVia<StopTokenOf<R>>,
    {
        fn drop(&mut self) {
            let Some(receiver) = self.0.take() else {
                return;
            };
            tracing::warn!("tokio runtime dropped a scheduled task before it ran");
            if receiver.into_stopped().is_err() {
                tracing::error!("scheduled task lost, its receiver cannot be stopped");
            }
        }
    }

    /// Operation of [`TokioSchedule`].
    pub struct TokioOp<R> {
        handle: Handle,
        receiver: Option<R>,
    }

    impl<R> OperationState for TokioOp<R>
    where
        R: ReceiveValue<()> + StoppedVia<StopTokenOf<R>> + Send + 'static,
    {
        fn start(&mut self) {
            let Some(receiver) = self.receiver.take() else {
                return;
            };
            let (handoff, _) = Handoff::new(receiver);
            let task = Task(handoff);
            drop(self.handle.spawn(async move { task.0.run() }));
        }
    }

    impl<R> Connect<R> for TokioSchedule
    where
        R: ReceiveValue<()> + StoppedVia<StopTokenOf<R>> + Send + 'static,
    {
        type Operation = TokioOp<R>;

        fn connect(self, receiver: R) -> TokioOp<R> {
            TokioOp {
                handle: self.handle,
                receiver: Some(receiver),
            }
        }
    }

    impl<R> Connect<R> for &TokioSchedule
    where
        R: ReceiveValue<()> + StoppedVia<StopTokenOf<R>> + Send + 'static,
    {
        type Operation = TokioOp<R>;

        fn connect(self, receiver: R) -> TokioOp<R> {
            self.clone().connect(receiver)
        }
    }
}
