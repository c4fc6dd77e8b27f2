//! Error codes and the structured error value
//!
//! Rejection reasons travel in-band as `Val::Error(ErrorInfo)`, the same
//! channel continuation handlers see every other payload on. `CadenceError`
//! covers the few API misuses that are errors of the caller rather than
//! outcomes of a deferred.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Val;

/* ===================== Error Codes ===================== */

/// Every member of a collection rejected.
pub const AGGREGATE: &str = "AggregateError";

/// A deferred was rejected through its cancel handle.
pub const CANCELED: &str = "Canceled";

/// A retried producer kept rejecting until attempts ran out.
pub const RETRY_EXHAUSTED: &str = "RetryExhausted";

/* ===================== Error Values ===================== */

/// Structured error value carried by `Val::Error`
///
/// `errors` is empty except for aggregate failures, where it holds every
/// member's rejection reason, index-aligned to the input collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<Val>,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorInfo {
            code: code.into(),
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Aggregate failure bundling per-member rejection reasons.
    pub fn aggregate(message: impl Into<String>, errors: Vec<Val>) -> Self {
        ErrorInfo {
            code: AGGREGATE.to_string(),
            message: message.into(),
            errors,
        }
    }
}

/// Caller-side API misuse, distinct from in-band `Val::Error` rejections
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CadenceError {
    #[error("pool concurrency limit must be at least 1")]
    ZeroPoolLimit,
}
