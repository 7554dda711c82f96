use fanin::{
    connect, never,
    env::StopEnv,
    schedulers::{Scheduler, ThreadScheduler, TokioScheduler},
    stop::StopSource,
    stop_when, then, when_any, OperationState, ReceiveStopped, ReceiveValue, Receiver, SenderExt,
};
use std::time::Duration;
use tokio::sync::oneshot;

/// Reports how a download ended.
struct Report {
    env: StopEnv,
    done: oneshot::Sender<()>,
}

impl Receiver for Report {
    type Env = StopEnv;

    fn env(&self) -> StopEnv {
        self.env.clone()
    }
}

impl ReceiveValue<(u64,)> for Report {
    fn set_value(self, (bytes,): (u64,)) {
        println!("downloaded {} bytes", bytes);
        let _ = self.done.send(());
    }
}

impl ReceiveStopped for Report {
    fn set_stopped(self) {
        println!("download stopped");
        let _ = self.done.send(());
    }
}

#[tokio::main]
async fn main() {
    let runtime = TokioScheduler::current().expect("inside a runtime");

    // A download racing a deadline: whichever comes first ends it.
    let download = runtime.schedule() | then(|()| (fastrand::u64(1..4096),));
    let deadline = ThreadScheduler::new().schedule_after(Duration::from_millis(fastrand::u64(0..5)));
    let outcome = stop_when(deadline, (download,))
        .into_future::<(u64,), ()>()
        .await;
    match outcome {
        Ok(Some((bytes,))) => println!("made the deadline with {} bytes", bytes),
        Ok(None) => println!("missed the deadline"),
        Err(error) => println!("download failed: {}", error),
    }

    // The same download, abandoned by the user before it gets going.
    let source = StopSource::new();
    let (done, finished) = oneshot::channel();
    let report = Report {
        env: StopEnv::new(source.token()),
        done,
    };
    let stalled = when_any((never(), never()));
    let mut op = connect(stalled, report);
    op.start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    println!("user pressed cancel");
    source.request_stop();
    let _ = finished.await;
}
