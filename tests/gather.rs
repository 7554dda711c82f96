mod common;

use common::assert_same;
use fanin::env::{EmptyEnv, StopEnv};
use fanin::gather::{
    Empty, ErrorTypesOf, GatherSignatures, Identity, List, OneOf, Optional, StoppedTypesOf, Tuple,
    ValueTypesOf, Variant,
};
use fanin::signatures::ValueChannel;
use fanin::{sigs, Just, JustError, JustStopped, Never, WhenAny};

type Pair = WhenAny<(Just<(i32,)>, Just<(String, u8)>)>;

#[test]
fn single_value_collapses_with_identity() {
    assert_same::<ValueTypesOf<Just<(i32,)>, EmptyEnv, Identity, Identity>, i32>();
    assert_same::<ErrorTypesOf<JustError<String>, EmptyEnv, Identity, Identity>, String>();
}

#[test]
fn defaults_are_tuple_and_variant() {
    assert_same::<ValueTypesOf<Just<(i32,)>, EmptyEnv>, OneOf<(i32,), Empty>>();
    assert_same::<ValueTypesOf<Just<(i32,)>, EmptyEnv, Tuple, Variant>, OneOf<(i32,), Empty>>();
    assert_same::<ValueTypesOf<Pair, EmptyEnv>, OneOf<(i32,), OneOf<(String, u8), Empty>>>();
    assert_same::<ErrorTypesOf<JustError<u8>, EmptyEnv>, OneOf<(u8,), Empty>>();
}

#[test]
fn empty_channel_gathers_to_nothing() {
    assert_same::<ErrorTypesOf<Just<(i32,)>, EmptyEnv>, Empty>();
    assert_same::<StoppedTypesOf<Never, EmptyEnv>, Empty>();
    assert_same::<ValueTypesOf<JustStopped, EmptyEnv, Tuple, List>, sigs![]>();
}

#[test]
fn stopped_appears_with_a_stoppable_environment() {
    assert_same::<StoppedTypesOf<Never, StopEnv>, OneOf<(), Empty>>();
    assert_same::<StoppedTypesOf<Never, StopEnv, Tuple, Identity>, ()>();
}

#[test]
fn other_aggregators() {
    assert_same::<ValueTypesOf<Just<(i32,)>, EmptyEnv, Optional, Identity>, Option<i32>>();
    assert_same::<
        ValueTypesOf<Pair, EmptyEnv, Tuple, List>,
        fanin::signatures::Cons<(i32,), fanin::signatures::Cons<(String, u8), fanin::signatures::Nil>>,
    >();
}

#[test]
fn gather_is_generic_over_the_channel() {
    assert_same::<
        GatherSignatures<ValueChannel, Just<(i32, i32)>, EmptyEnv, Tuple, Identity>,
        (i32, i32),
    >();
}

#[test]
fn variant_values_can_be_built() {
    let value: ValueTypesOf<Pair, EmptyEnv> = OneOf::There(OneOf::Here(("x".to_owned(), 1)));
    assert!(matches!(value, OneOf::There(OneOf::Here((_, 1)))));
}
