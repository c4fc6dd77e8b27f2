//! Combinators over collections of deferreds
//!
//! Every combinator takes a fixed, ordered member collection; each member is
//! a deferred or a plain value (treated as an already-fulfilled deferred).
//! "First" always means settlement callback order on the scheduler, not
//! input order: members may settle in any order, and only the output arrays
//! of [`wait_all`] and [`settle_all`] are index-stable.

pub mod pool;
pub mod retry;
pub mod sequence;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use pool::Pool;
pub use retry::{retry, retry_with_backoff};
pub use sequence::in_sequence;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::deferred::{ChainResult, Deferred, Eventual};
use crate::errors::ErrorInfo;
use crate::value::Val;

/// Zero-argument producer of a deferred
///
/// Combinator helpers invoke it when its turn arrives; a synchronous error
/// is captured as an immediate rejection of the corresponding deferred.
pub type Producer = Box<dyn FnMut() -> Result<Deferred, Val>>;

/* ===================== Outcome Records ===================== */

/// Per-member outcome record produced by [`settle_all`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Fulfilled { value: Val },
    Rejected { reason: Val },
}

impl From<Outcome> for Val {
    fn from(outcome: Outcome) -> Val {
        let mut record = HashMap::new();
        match outcome {
            Outcome::Fulfilled { value } => {
                record.insert("status".to_string(), Val::Str("fulfilled".to_string()));
                record.insert("value".to_string(), value);
            }
            Outcome::Rejected { reason } => {
                record.insert("status".to_string(), Val::Str("rejected".to_string()));
                record.insert("reason".to_string(), reason);
            }
        }
        Val::Obj(record)
    }
}

/* ===================== Combinators ===================== */

/// Wait for every member to fulfill; fail fast on the first rejection
///
/// Fulfills with the members' values as a list in input index order once all
/// have fulfilled. Rejects with the reason of the first member to reject;
/// the other members keep running, but their later outcomes are discarded.
/// An empty input fulfills immediately with an empty list.
pub fn wait_all(members: Vec<Eventual>) -> Deferred {
    let aggregate = Deferred::pending();
    let total = members.len();
    if total == 0 {
        aggregate.fulfill(Val::List(Vec::new()));
        return aggregate;
    }

    let results: Rc<RefCell<Vec<Option<Val>>>> = Rc::new(RefCell::new(vec![None; total]));
    let completed = Rc::new(Cell::new(0usize));

    for (index, member) in members.into_iter().enumerate() {
        let results = results.clone();
        let completed = completed.clone();
        let on_value = aggregate.clone();
        let on_error = aggregate.clone();
        member.into_deferred().then(
            Some(Box::new(move |value| {
                results.borrow_mut()[index] = Some(value);
                completed.set(completed.get() + 1);
                if completed.get() == total {
                    let values: Vec<Val> = results
                        .borrow_mut()
                        .iter_mut()
                        .map(|slot| slot.take().unwrap_or(Val::Null))
                        .collect();
                    debug!(total, "wait_all complete");
                    on_value.fulfill(Val::List(values));
                }
                ChainResult::Value(Val::Null)
            })),
            Some(Box::new(move |reason| {
                // Fail fast; later sibling outcomes stay invisible.
                on_error.reject(reason);
                ChainResult::Value(Val::Null)
            })),
        );
    }
    aggregate
}

/// Wait for every member to settle, collecting outcome records
///
/// Never rejects. Fulfills once every member has settled, with a list of
/// [`Outcome`] records index-aligned to the input regardless of completion
/// order. An empty input fulfills immediately with an empty list.
pub fn settle_all(members: Vec<Eventual>) -> Deferred {
    let aggregate = Deferred::pending();
    let total = members.len();
    if total == 0 {
        aggregate.fulfill(Val::List(Vec::new()));
        return aggregate;
    }

    let results: Rc<RefCell<Vec<Option<Outcome>>>> = Rc::new(RefCell::new(vec![None; total]));
    let settled = Rc::new(Cell::new(0usize));

    for (index, member) in members.into_iter().enumerate() {
        let on_value = (results.clone(), settled.clone(), aggregate.clone());
        let on_error = (results.clone(), settled.clone(), aggregate.clone());
        member.into_deferred().then(
            Some(Box::new(move |value| {
                let (results, settled, aggregate) = on_value;
                record_outcome(&results, &settled, total, &aggregate, index, Outcome::Fulfilled { value });
                ChainResult::Value(Val::Null)
            })),
            Some(Box::new(move |reason| {
                let (results, settled, aggregate) = on_error;
                record_outcome(&results, &settled, total, &aggregate, index, Outcome::Rejected { reason });
                ChainResult::Value(Val::Null)
            })),
        );
    }
    aggregate
}

/// Adopt the outcome of whichever member settles first
///
/// Settles, fulfilled or rejected, with the first settlement in wall-clock
/// order; every later settlement is ignored. An empty input never settles:
/// the returned deferred stays pending forever, a documented caller hazard.
pub fn race_first(members: Vec<Eventual>) -> Deferred {
    let aggregate = Deferred::pending();
    for member in members {
        let on_value = aggregate.clone();
        let on_error = aggregate.clone();
        member.into_deferred().then(
            Some(Box::new(move |value| {
                on_value.fulfill(value);
                ChainResult::Value(Val::Null)
            })),
            Some(Box::new(move |reason| {
                on_error.reject(reason);
                ChainResult::Value(Val::Null)
            })),
        );
    }
    aggregate
}

/// Fulfill with the first member to fulfill
///
/// Rejections are tolerated until every member has rejected, at which point
/// the aggregate rejects with an [`ErrorInfo::aggregate`] bundling each
/// member's reason, index-aligned to the input. An empty input rejects
/// immediately with an empty aggregate.
pub fn first_success(members: Vec<Eventual>) -> Deferred {
    let aggregate = Deferred::pending();
    let total = members.len();
    if total == 0 {
        aggregate.reject(Val::Error(ErrorInfo::aggregate(
            "all deferreds rejected",
            Vec::new(),
        )));
        return aggregate;
    }

    let reasons: Rc<RefCell<Vec<Option<Val>>>> = Rc::new(RefCell::new(vec![None; total]));
    let rejected = Rc::new(Cell::new(0usize));

    for (index, member) in members.into_iter().enumerate() {
        let reasons = reasons.clone();
        let rejected = rejected.clone();
        let on_value = aggregate.clone();
        let on_error = aggregate.clone();
        member.into_deferred().then(
            Some(Box::new(move |value| {
                on_value.fulfill(value);
                ChainResult::Value(Val::Null)
            })),
            Some(Box::new(move |reason| {
                reasons.borrow_mut()[index] = Some(reason);
                rejected.set(rejected.get() + 1);
                if rejected.get() == total {
                    let errors: Vec<Val> = reasons
                        .borrow_mut()
                        .iter_mut()
                        .map(|slot| slot.take().unwrap_or(Val::Null))
                        .collect();
                    debug!(total, "first_success exhausted");
                    on_error.reject(Val::Error(ErrorInfo::aggregate(
                        "all deferreds rejected",
                        errors,
                    )));
                }
                ChainResult::Value(Val::Null)
            })),
        );
    }
    aggregate
}

fn record_outcome(
    results: &Rc<RefCell<Vec<Option<Outcome>>>>,
    settled: &Rc<Cell<usize>>,
    total: usize,
    aggregate: &Deferred,
    index: usize,
    outcome: Outcome,
) {
    results.borrow_mut()[index] = Some(outcome);
    settled.set(settled.get() + 1);
    if settled.get() == total {
        let records: Vec<Val> = results
            .borrow_mut()
            .iter_mut()
            .map(|slot| slot.take().map(Val::from).unwrap_or(Val::Null))
            .collect();
        debug!(total, "settle_all complete");
        aggregate.fulfill(Val::List(records));
    }
}
