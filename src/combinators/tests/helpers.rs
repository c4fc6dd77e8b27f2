//! Test helpers for combinator tests
//!
//! Members and producers in the shapes the combinators are actually fed:
//! timer-settled deferreds with distinct delays, so completion order and
//! input order can be pulled apart.

use crate::deferred::Eventual;
use crate::scheduler::{after_error, after_value};
use crate::value::Val;

/// Member fulfilling with `value` after `delay_ms`.
pub fn ok_after(delay_ms: u64, value: impl Into<Val>) -> Eventual {
    Eventual::Deferred(after_value(delay_ms, value))
}

/// Member rejecting with `reason` after `delay_ms`.
pub fn fail_after(delay_ms: u64, reason: impl Into<Val>) -> Eventual {
    Eventual::Deferred(after_error(delay_ms, reason))
}

pub fn num(n: f64) -> Val {
    Val::Num(n)
}

pub fn text(s: &str) -> Val {
    Val::Str(s.to_string())
}
