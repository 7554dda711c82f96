#[macro_use]
mod common;

use common::{assert_same, MoveOnly};
use fanin::env::{EmptyEnv, Env, StopEnv};
use fanin::gather::{Empty, OneOf, ValueTypesOf};
use fanin::race::FirstSuccess;
use fanin::signatures::{
    sends_stopped, Answered, CompletionSignaturesOf, DeclaredSignatures, ErrorSignaturesOf,
    Queried, QuerySignatures, SetError, SetStopped, SetValue, SigList, StoppedSignaturesOf,
    Unanswered, ValueSignaturesOf,
};
use fanin::stop::{NeverStopToken, StopToken};
use std::marker::PhantomData;
use fanin::testing::{Recorder, ValueSink};
use fanin::{
    sigs, Connect, Just, JustError, JustStopped, Never, ReceiverOf, Sender, WhenAny,
};

/// Declares one set of signatures, but answers the query with another.
struct Overridden;

impl Sender for Overridden {
    type Source = Queried;
}

impl DeclaredSignatures for Overridden {
    type Signatures = sigs![SetValue<(i32,)>];
}

impl<E: Env> QuerySignatures<E> for Overridden {
    type Answer = Answered<<E::StopToken as StopToken>::WithStopped<sigs![SetError<String>]>>;
}

/// Only answers the query when it can be stopped; otherwise its declaration applies.
struct StopAware;

impl Sender for StopAware {
    type Source = Queried;
}

impl DeclaredSignatures for StopAware {
    type Signatures = sigs![SetValue<(i32,)>];
}

impl QuerySignatures<StopEnv> for StopAware {
    type Answer = Answered<sigs![SetValue<(i32,)>, SetStopped]>;
}

impl QuerySignatures<EmptyEnv> for StopAware {
    type Answer = Unanswered;
}

/// An environment carrying the type `T`.
struct Carrying<T>(PhantomData<fn() -> T>);

impl<T> Clone for Carrying<T> {
    fn clone(&self) -> Self {
        Carrying(PhantomData)
    }
}

impl<T: 'static> Env for Carrying<T> {
    type StopToken = NeverStopToken;

    fn stop_token(&self) -> NeverStopToken {
        NeverStopToken
    }
}

/// Sends whatever type its environment carries.
struct Echo;

impl Sender for Echo {
    type Source = Queried;
}

impl DeclaredSignatures for Echo {
    type Signatures = sigs![SetValue<()>];
}

impl<T: 'static> QuerySignatures<Carrying<T>> for Echo {
    type Answer = Answered<sigs![SetValue<(T,)>]>;
}

impl QuerySignatures<EmptyEnv> for Echo {
    type Answer = Unanswered;
}

/// Signatures on every channel, interleaved.
struct Mixed;

impl Sender for Mixed {
    type Source = fanin::signatures::Declared;
}

impl DeclaredSignatures for Mixed {
    type Signatures =
        sigs![SetValue<(i32,)>, SetError<String>, SetStopped, SetValue<(String, u8)>, SetError<u8>];
}

#[test]
fn just_senders_declare_one_signature() {
    assert_same::<CompletionSignaturesOf<Just<(i32,)>>, sigs![SetValue<(i32,)>]>();
    assert_same::<CompletionSignaturesOf<Just<()>>, sigs![SetValue<()>]>();
    assert_same::<CompletionSignaturesOf<JustError<String>>, sigs![SetError<String>]>();
    assert_same::<CompletionSignaturesOf<JustStopped>, sigs![SetStopped]>();
}

#[test]
fn declared_signatures_ignore_the_environment() {
    assert_same::<CompletionSignaturesOf<Just<(i32,)>, StopEnv>, sigs![SetValue<(i32,)>]>();
}

#[test]
fn query_wins_over_declaration() {
    assert_same::<CompletionSignaturesOf<Overridden>, sigs![SetError<String>]>();
    assert_same::<CompletionSignaturesOf<Overridden, StopEnv>, sigs![SetError<String>, SetStopped]>();
    assert_same::<CompletionSignaturesOf<&Overridden>, sigs![SetError<String>]>();
}

#[test]
fn unanswered_query_falls_back_to_declaration() {
    assert_same::<CompletionSignaturesOf<StopAware, StopEnv>, sigs![SetValue<(i32,)>, SetStopped]>();
    assert_same::<CompletionSignaturesOf<StopAware, EmptyEnv>, sigs![SetValue<(i32,)>]>();
    assert_same::<CompletionSignaturesOf<&StopAware, EmptyEnv>, sigs![SetValue<(i32,)>]>();

    assert!(sends_stopped::<StopAware, StopEnv>());
    assert!(!sends_stopped::<StopAware, EmptyEnv>());
}

#[test]
fn signatures_follow_a_type_carried_by_the_environment() {
    assert_same::<CompletionSignaturesOf<Echo, Carrying<i32>>, sigs![SetValue<(i32,)>]>();
    assert_same::<CompletionSignaturesOf<Echo, Carrying<f32>>, sigs![SetValue<(f32,)>]>();
    assert_same::<CompletionSignaturesOf<Echo, EmptyEnv>, sigs![SetValue<()>]>();

    assert_same::<ValueTypesOf<Echo, Carrying<i32>>, OneOf<(i32,), Empty>>();
    assert_same::<ValueTypesOf<Echo, Carrying<f32>>, OneOf<(f32,), Empty>>();
}

#[test]
fn channel_filters_keep_order() {
    assert_same::<ValueSignaturesOf<Mixed>, sigs![SetValue<(i32,)>, SetValue<(String, u8)>]>();
    assert_same::<ErrorSignaturesOf<Mixed>, sigs![SetError<String>, SetError<u8>]>();
    assert_same::<StoppedSignaturesOf<Mixed>, sigs![SetStopped]>();
    assert_eq!(<CompletionSignaturesOf<Mixed> as SigList>::LEN, 5);
    assert_eq!(<ValueSignaturesOf<Mixed> as SigList>::LEN, 2);
}

#[test]
fn stopped_depends_on_the_stop_token() {
    assert_same::<CompletionSignaturesOf<Never>, sigs![]>();
    assert_same::<CompletionSignaturesOf<Never, StopEnv>, sigs![SetStopped]>();

    assert!(!sends_stopped::<Never, EmptyEnv>());
    assert!(sends_stopped::<Never, StopEnv>());
    assert!(sends_stopped::<JustStopped, EmptyEnv>());
    assert!(!sends_stopped::<Just<(i32,)>, StopEnv>());
}

#[test]
fn race_concatenates_child_signatures() {
    type Race = WhenAny<(Just<(i32,)>, JustError<String>, Just<(i32,)>)>;

    assert_same::<
        CompletionSignaturesOf<Race>,
        sigs![SetValue<(i32,)>, SetError<String>, SetValue<(i32,)>],
    >();
    assert_same::<
        CompletionSignaturesOf<Race, StopEnv>,
        sigs![SetValue<(i32,)>, SetError<String>, SetValue<(i32,)>, SetStopped],
    >();
}

#[test]
fn race_children_see_a_stoppable_environment() {
    assert_same::<CompletionSignaturesOf<WhenAny<(Never,)>>, sigs![SetStopped]>();
    assert_same::<CompletionSignaturesOf<WhenAny<()>>, sigs![]>();
    assert_same::<CompletionSignaturesOf<WhenAny<(), FirstSuccess>, StopEnv>, sigs![SetStopped]>();
}

#[test]
fn mapped_signatures() {
    type Doubled = fanin::adaptors::Then<Mixed, fn((i32,)) -> (i64,)>;

    assert_same::<
        ValueSignaturesOf<fanin::adaptors::Then<Just<(i32,)>, fn((i32,)) -> (i64,)>>,
        sigs![SetValue<(i64,)>],
    >();
    assert!(!implements!(Doubled: fanin::signatures::QuerySignatures<EmptyEnv>));

    type Recovered = fanin::adaptors::UponStopped<JustStopped, fn() -> (u8,)>;
    assert_same::<CompletionSignaturesOf<Recovered>, sigs![SetValue<(u8,)>]>();
}

#[test]
fn receivers_must_accept_every_signature() {
    type Sink = ValueSink<(i32,)>;
    type Rec = Recorder<(i32,), String>;

    assert!(implements!(Sink: ReceiverOf<sigs![SetValue<(i32,)>, SetValue<(i32,)>]>));
    assert!(!implements!(Sink: ReceiverOf<sigs![SetValue<(i32,)>, SetStopped]>));
    assert!(!implements!(Sink: ReceiverOf<sigs![SetValue<(u8,)>]>));
    assert!(implements!(Rec: ReceiverOf<CompletionSignaturesOf<Overridden>>));
    assert!(!implements!(Rec: ReceiverOf<sigs![SetError<u8>]>));
}

#[test]
fn races_connect_without_stopped_channel_when_nothing_can_stop() {
    type Sink = ValueSink<(i32,)>;

    assert!(implements!(WhenAny<(Just<(i32,)>, Just<(i32,)>)>: Connect<Sink>));
    assert!(!implements!(WhenAny<(Just<(i32,)>, Never)>: Connect<Sink>));
}

#[test]
fn multi_shot_follows_payload_cloneability() {
    type Rec = Recorder<(MoveOnly,), ()>;
    type Copyable = Recorder<(i32,), ()>;

    assert!(implements!(Just<(MoveOnly,)>: Connect<Rec>));
    assert!(!implements!(&'static Just<(MoveOnly,)>: Connect<Rec>));
    assert!(implements!(&'static Just<(i32,)>: Connect<Copyable>));

    assert!(implements!(WhenAny<(Just<(MoveOnly,)>,)>: Connect<Rec>));
    assert!(!implements!(&'static WhenAny<(Just<(MoveOnly,)>,)>: Connect<Rec>));
    assert!(implements!(&'static WhenAny<(Just<(i32,)>, Never)>: Connect<Copyable>));
}
