//! Tests for continuation registration and chaining
//!
//! Handlers are scheduled, never invoked inside the registering call, and
//! outcomes flow link to link: values map, absences pass through, errors
//! reject the chained deferred only.

use std::cell::RefCell;
use std::rc::Rc;

use super::helpers::{record, seen};
use crate::deferred::{ChainResult, Deferred, DeferredState};
use crate::scheduler::run_until_idle;
use crate::value::Val;

#[test]
fn test_then_returns_a_new_pending_deferred() {
    let dv = Deferred::fulfilled(Val::Num(1.0));
    let chained = dv.then(None, None);

    // Settled source or not, the chained deferred comes back immediately
    // and has not settled yet.
    assert_eq!(chained.state(), DeferredState::Pending);
}

#[test]
fn test_handler_never_runs_in_registering_call() {
    // Synchronous probe right after registration must observe zero
    // invocations, even though the source was already settled.
    let observed = seen();
    let dv = Deferred::fulfilled(Val::Num(7.0));
    dv.then(Some(record(&observed)), None);

    assert!(observed.borrow().is_empty());

    run_until_idle();
    assert_eq!(*observed.borrow(), vec![Val::Num(7.0)]);
}

#[test]
fn test_handler_deferred_at_transition_time() {
    let observed = seen();
    let dv = Deferred::pending();
    dv.then(Some(record(&observed)), None);

    dv.fulfill(Val::Num(3.0));
    // The transition queued the reaction but nothing has drained yet.
    assert!(observed.borrow().is_empty());

    run_until_idle();
    assert_eq!(*observed.borrow(), vec![Val::Num(3.0)]);
}

#[test]
fn test_reactions_fire_in_registration_order() {
    let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let dv = Deferred::pending();
    for label in ["first", "second", "third"] {
        let order = order.clone();
        dv.then(
            Some(Box::new(move |value| {
                order.borrow_mut().push(label);
                ChainResult::Value(value)
            })),
            None,
        );
    }

    dv.fulfill(Val::Null);
    run_until_idle();
    assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
}

#[test]
fn test_value_mapping_chain() {
    // x + 1 then x * 2 over a deferred fulfilled with 3 yields 8.
    let dv = Deferred::pending();
    let plus_one = dv.then(
        Some(Box::new(|value| {
            let Val::Num(n) = value else {
                return ChainResult::Throw(Val::Str("not a number".to_string()));
            };
            ChainResult::Value(Val::Num(n + 1.0))
        })),
        None,
    );
    let doubled = plus_one.then(
        Some(Box::new(|value| {
            let Val::Num(n) = value else {
                return ChainResult::Throw(Val::Str("not a number".to_string()));
            };
            ChainResult::Value(Val::Num(n * 2.0))
        })),
        None,
    );

    dv.fulfill(Val::Num(3.0));
    run_until_idle();
    assert_eq!(doubled.state(), DeferredState::Fulfilled);
    assert_eq!(doubled.value(), Some(Val::Num(8.0)));
}

#[test]
fn test_missing_fulfillment_handler_passes_value_through() {
    let dv = Deferred::fulfilled(Val::Str("unchanged".to_string()));
    let chained = dv.then(None, None);

    run_until_idle();
    assert_eq!(chained.value(), Some(Val::Str("unchanged".to_string())));
}

#[test]
fn test_rejection_passes_through_fulfillment_only_links() {
    // A rejection crosses links that only register fulfillment handlers
    // untouched, and those handlers never run.
    let observed = seen();
    let dv = Deferred::pending();
    let tail = dv
        .then(Some(record(&observed)), None)
        .then(Some(record(&observed)), None);

    dv.reject(Val::Str("original".to_string()));
    run_until_idle();

    assert!(observed.borrow().is_empty());
    assert_eq!(tail.state(), DeferredState::Rejected);
    assert_eq!(tail.reason(), Some(Val::Str("original".to_string())));
}

#[test]
fn test_catch_recovers_the_chain() {
    let dv = Deferred::rejected(Val::Str("bad".to_string()));
    let recovered = dv.catch(Box::new(|reason| {
        let Val::Str(text) = reason else {
            return ChainResult::Throw(Val::Str("unexpected reason".to_string()));
        };
        ChainResult::Value(Val::Str(format!("recovered from {text}")))
    }));

    run_until_idle();
    assert_eq!(recovered.state(), DeferredState::Fulfilled);
    assert_eq!(
        recovered.value(),
        Some(Val::Str("recovered from bad".to_string()))
    );
}

#[test]
fn test_handler_throw_rejects_only_the_chained_deferred() {
    let dv = Deferred::fulfilled(Val::Num(1.0));
    let chained = dv.then(
        Some(Box::new(|_| ChainResult::Throw(Val::Str("handler died".to_string())))),
        None,
    );

    run_until_idle();
    // The source is untouched; the failure is isolated to its link.
    assert_eq!(dv.state(), DeferredState::Fulfilled);
    assert_eq!(chained.state(), DeferredState::Rejected);
    assert_eq!(chained.reason(), Some(Val::Str("handler died".to_string())));
}

#[test]
fn test_handler_returning_deferred_is_flattened() {
    let inner = Deferred::pending();
    let inner_for_handler = inner.clone();
    let dv = Deferred::fulfilled(Val::Null);
    let chained = dv.then(
        Some(Box::new(move |_| ChainResult::Chain(inner_for_handler))),
        None,
    );

    run_until_idle();
    assert_eq!(chained.state(), DeferredState::Pending);

    inner.fulfill(Val::Num(11.0));
    run_until_idle();
    assert_eq!(chained.state(), DeferredState::Fulfilled);
    assert_eq!(chained.value(), Some(Val::Num(11.0)));
}

#[test]
fn test_finally_runs_on_fulfillment_and_passes_through() {
    let ran = Rc::new(RefCell::new(false));
    let probe = ran.clone();
    let dv = Deferred::fulfilled(Val::Num(4.0));
    let chained = dv.finally(move || *probe.borrow_mut() = true);

    run_until_idle();
    assert!(*ran.borrow());
    assert_eq!(chained.state(), DeferredState::Fulfilled);
    assert_eq!(chained.value(), Some(Val::Num(4.0)));
}

#[test]
fn test_finally_runs_on_rejection_and_passes_through() {
    let ran = Rc::new(RefCell::new(false));
    let probe = ran.clone();
    let dv = Deferred::rejected(Val::Str("kept".to_string()));
    let chained = dv.finally(move || *probe.borrow_mut() = true);
    // Keep the rejection observed downstream.
    let tail = chained.catch(Box::new(ChainResult::Value));

    run_until_idle();
    assert!(*ran.borrow());
    assert_eq!(chained.state(), DeferredState::Rejected);
    assert_eq!(chained.reason(), Some(Val::Str("kept".to_string())));
    assert_eq!(tail.value(), Some(Val::Str("kept".to_string())));
}
