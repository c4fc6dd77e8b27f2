//! Tests for settle_all: every outcome collected, index-aligned, no rejection

use super::helpers::{fail_after, num, ok_after, text};
use crate::combinators::{settle_all, Outcome};
use crate::deferred::DeferredState;
use crate::scheduler::run_until_idle;
use crate::value::Val;

#[test]
fn test_empty_input_fulfills_with_empty_list() {
    let aggregate = settle_all(Vec::new());
    assert_eq!(aggregate.state(), DeferredState::Fulfilled);
    assert_eq!(aggregate.value(), Some(Val::List(Vec::new())));
}

#[test]
fn test_mixed_outcomes_are_recorded_in_input_order() {
    // ok(1), fail("e"), ok(3): records stay index-aligned even though the
    // failure settles first.
    let aggregate = settle_all(vec![
        ok_after(20, num(1.0)),
        fail_after(5, text("e")),
        ok_after(10, num(3.0)),
    ]);

    run_until_idle();
    assert_eq!(aggregate.state(), DeferredState::Fulfilled);

    let expected = Val::List(vec![
        Val::from(Outcome::Fulfilled { value: num(1.0) }),
        Val::from(Outcome::Rejected { reason: text("e") }),
        Val::from(Outcome::Fulfilled { value: num(3.0) }),
    ]);
    assert_eq!(aggregate.value(), Some(expected));
}

#[test]
fn test_never_rejects_even_when_all_members_fail() {
    let aggregate = settle_all(vec![
        fail_after(10, text("a")),
        fail_after(5, text("b")),
    ]);

    run_until_idle();
    assert_eq!(aggregate.state(), DeferredState::Fulfilled);
    let expected = Val::List(vec![
        Val::from(Outcome::Rejected { reason: text("a") }),
        Val::from(Outcome::Rejected { reason: text("b") }),
    ]);
    assert_eq!(aggregate.value(), Some(expected));
}

#[test]
fn test_outcome_records_serialize_with_status_tag() {
    let fulfilled = serde_json::to_value(Outcome::Fulfilled { value: num(1.0) }).unwrap();
    assert_eq!(fulfilled["status"], "fulfilled");

    let rejected = serde_json::to_value(Outcome::Rejected { reason: text("e") }).unwrap();
    assert_eq!(rejected["status"], "rejected");

    let roundtrip: Outcome = serde_json::from_value(rejected).unwrap();
    assert_eq!(roundtrip, Outcome::Rejected { reason: text("e") });
}
