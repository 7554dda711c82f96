#![cfg(feature = "runtime-tokio")]

use fanin::holder::Completion;
use fanin::schedulers::{Scheduler, TokioScheduler};
use fanin::testing::Recorder;
use fanin::{connect, never, stop_when, then, when_any, OperationState, SenderExt};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn schedules_onto_the_runtime() {
    let scheduler = TokioScheduler::current().expect("inside a runtime");
    let race = when_any((scheduler.schedule() | then(|()| (1,)), never()));
    let outcome = race.into_future::<(i32,), ()>().await;
    assert_eq!(outcome.ok(), Some(Some((1,))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn controller_on_the_runtime_stops_idle_children() {
    let scheduler = TokioScheduler::current().expect("inside a runtime");
    let race = stop_when(scheduler.schedule(), (never(), never()));
    let outcome = race.into_future::<(), ()>().await;
    assert_eq!(outcome.ok(), Some(None));
}

#[test]
fn no_runtime_no_scheduler() {
    assert!(TokioScheduler::current().is_err());
}

#[test]
fn task_dropped_by_a_stopped_runtime_completes_stopped() {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let scheduler = TokioScheduler::from_handle(runtime.handle().clone());
    runtime.shutdown_timeout(Duration::from_secs(1));

    let (receiver, recording, _source) = Recorder::<(), ()>::stoppable();
    let mut op = connect(scheduler.schedule(), receiver);
    op.start();
    assert!(recording.wait_for(1, Duration::from_secs(5)));
    assert_eq!(recording.take(), vec![Completion::Stopped]);
}
