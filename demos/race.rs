use fanin::{
    first_successful, just_error,
    schedulers::{Scheduler, ThreadScheduler},
    sync_wait, then, when_any, WaitError,
};
use std::{io, time::Duration};

fn main() {
    let scheduler = ThreadScheduler::new().name("mirror");

    let mirror = |name: &'static str| {
        let latency = Duration::from_millis(fastrand::u64(20..200));
        println!("{} will answer in {:?}", name, latency);
        scheduler.schedule_after(latency) | then(move |()| (name,))
    };

    let fastest = first_successful((
        mirror("eu-west"),
        mirror("us-east"),
        mirror("ap-south"),
        just_error(io::Error::other("mirror list is stale")),
    ));
    match sync_wait::<(&str,), io::Error, _>(fastest) {
        Ok(Some((name,))) => println!("downloading from {}", name),
        Ok(None) => println!("download cancelled"),
        Err(WaitError::Failed(error)) => println!("no mirror answered: {}", error),
        Err(WaitError::Abandoned) => println!("download abandoned"),
    }

    let toss = || Duration::from_millis(fastrand::u64(0..10));
    let coin = when_any((
        scheduler.schedule_after(toss()) | then(|()| ("heads",)),
        scheduler.schedule_after(toss()) | then(|()| ("tails",)),
    ));
    if let Ok(Some((side,))) = sync_wait::<(&str,), io::Error, _>(coin) {
        println!("the coin says {}", side);
    }
}
