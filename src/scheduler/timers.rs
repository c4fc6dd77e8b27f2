//! Timer-based producers
//!
//! The timeout-style collaborators that combinator examples, retries, and
//! tests drive deferreds with. Each returns a deferred settled from the
//! timer queue once its deadline passes on the scheduler clock.

use crate::deferred::Deferred;
use crate::value::Val;

/// Fulfills with `Null` once `delay_ms` has elapsed.
pub fn after(delay_ms: u64) -> Deferred {
    after_value(delay_ms, Val::Null)
}

/// Fulfills with `value` once `delay_ms` has elapsed.
pub fn after_value(delay_ms: u64, value: impl Into<Val>) -> Deferred {
    let dv = Deferred::pending();
    let handle = dv.clone();
    let value = value.into();
    super::schedule_timer(delay_ms, move || {
        handle.fulfill(value);
    });
    dv
}

/// Rejects with `reason` once `delay_ms` has elapsed.
pub fn after_error(delay_ms: u64, reason: impl Into<Val>) -> Deferred {
    let dv = Deferred::pending();
    let handle = dv.clone();
    let reason = reason.into();
    super::schedule_timer(delay_ms, move || {
        handle.reject(reason);
    });
    dv
}
