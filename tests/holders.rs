mod common;

use common::MoveOnly;
use fanin::holder::{
    BoxedHolder, Completion, Deliver, ErasedHolder, ErrorHolder, StoppedHolder, ValueHolder,
};
use fanin::testing::{Recorder, ValueSink};

type Outcome = Completion<(i32,), String>;

#[test]
fn holders_deliver_on_their_channel() {
    let (receiver, recording) = Recorder::<(i32,), String>::new();
    ValueHolder::new((1,)).deliver(receiver);
    let (receiver, errors) = Recorder::<(i32,), String>::new();
    ErrorHolder::new("bad".to_owned()).deliver(receiver);
    let (receiver, stops) = Recorder::<(i32,), String>::new();
    StoppedHolder.deliver(receiver);

    assert_eq!(recording.take(), vec![Outcome::Value((1,))]);
    assert_eq!(errors.take(), vec![Outcome::Error("bad".to_owned())]);
    assert_eq!(stops.take(), vec![Outcome::Stopped]);
}

#[test]
fn value_holder_needs_only_the_value_channel() {
    let (receiver, values) = ValueSink::<(MoveOnly,)>::new();
    ValueHolder((MoveOnly(3),)).deliver(receiver);
    assert_eq!(values.take(), vec![(MoveOnly(3),)]);
}

#[test]
fn completion_round_trips_through_a_receiver() {
    let outcomes = [
        Outcome::Value((4,)),
        Outcome::Error("e".to_owned()),
        Outcome::Stopped,
    ];
    for outcome in outcomes {
        let (receiver, recording) = Recorder::<(i32,), String>::new();
        outcome.clone().deliver(receiver);
        assert_eq!(recording.take(), vec![outcome]);
    }
}

#[test]
fn completion_from_holders() {
    assert!(Outcome::from(ValueHolder((1,))).is_value());
    assert!(Outcome::from(ErrorHolder(String::new())).is_error());
    assert!(Outcome::from(StoppedHolder).is_stopped());
}

#[test]
fn boxed_holders_mix_channels() {
    let holders: Vec<BoxedHolder<Recorder<(i32,), String>>> = vec![
        Box::new(ValueHolder((1,))),
        Box::new(ErrorHolder("two".to_owned())),
        Box::new(StoppedHolder),
    ];
    let delivered: Vec<Outcome> = holders
        .into_iter()
        .flat_map(|holder| {
            let (receiver, recording) = Recorder::new();
            holder.deliver_boxed(receiver);
            recording.take()
        })
        .collect();

    assert_eq!(
        delivered,
        vec![
            Outcome::Value((1,)),
            Outcome::Error("two".to_owned()),
            Outcome::Stopped,
        ]
    );
}
