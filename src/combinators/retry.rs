//! Retrying producers with a delay between attempts

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::Producer;
use crate::deferred::{ChainResult, Deferred};
use crate::errors::{self, ErrorInfo};
use crate::scheduler;
use crate::value::Val;

/// Invoke `producer`, retrying with a fixed delay on each rejection
///
/// Up to `retries` re-invocations follow the initial attempt, each after
/// `delay_ms` on the timer queue. Exhaustion rejects with a
/// `RetryExhausted` error carrying the final reason. A synchronous producer
/// error rejects immediately without retrying.
pub fn retry(producer: Producer, retries: u32, delay_ms: u64) -> Deferred {
    let target = Deferred::pending();
    attempt(
        Rc::new(RefCell::new(producer)),
        target.clone(),
        retries,
        retries,
        delay_ms,
        false,
    );
    target
}

/// Same as [`retry`], with the delay doubling after each failed attempt.
pub fn retry_with_backoff(producer: Producer, retries: u32, delay_ms: u64) -> Deferred {
    let target = Deferred::pending();
    attempt(
        Rc::new(RefCell::new(producer)),
        target.clone(),
        retries,
        retries,
        delay_ms,
        true,
    );
    target
}

fn attempt(
    producer: Rc<RefCell<Producer>>,
    target: Deferred,
    retries: u32,
    tries_left: u32,
    delay_ms: u64,
    backoff: bool,
) {
    let produced = {
        let mut produce = producer.borrow_mut();
        (&mut **produce)()
    };
    let dv = match produced {
        Ok(dv) => dv,
        Err(reason) => {
            target.reject(reason);
            return;
        }
    };

    let on_value = target.clone();
    dv.then(
        Some(Box::new(move |value| {
            on_value.fulfill(value);
            ChainResult::Value(Val::Null)
        })),
        Some(Box::new(move |reason| {
            if tries_left == 0 {
                let mut info = ErrorInfo::new(
                    errors::RETRY_EXHAUSTED,
                    format!("failed after {} attempts", retries + 1),
                );
                info.errors.push(reason);
                target.reject(Val::Error(info));
            } else {
                debug!(tries_left, delay_ms, "retrying after rejection");
                scheduler::schedule_timer(delay_ms, move || {
                    let next_delay = if backoff { delay_ms * 2 } else { delay_ms };
                    attempt(producer, target, retries, tries_left - 1, next_delay, backoff);
                });
            }
            ChainResult::Value(Val::Null)
        })),
    );
}
