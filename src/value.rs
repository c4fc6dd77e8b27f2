//! Runtime value types

use crate::errors::ErrorInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime value type
///
/// The opaque payload a deferred settles with. A `Val` never contains a
/// deferred: fulfilling with one goes through [`Eventual`](crate::Eventual)
/// and is flattened before it lands here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Obj(HashMap<String, Val>),
    /// Error value with code and message
    Error(ErrorInfo),
}

impl From<bool> for Val {
    fn from(v: bool) -> Val {
        Val::Bool(v)
    }
}

impl From<f64> for Val {
    fn from(v: f64) -> Val {
        Val::Num(v)
    }
}

impl From<&str> for Val {
    fn from(v: &str) -> Val {
        Val::Str(v.to_string())
    }
}

impl From<String> for Val {
    fn from(v: String) -> Val {
        Val::Str(v)
    }
}

impl From<Vec<Val>> for Val {
    fn from(v: Vec<Val>) -> Val {
        Val::List(v)
    }
}

impl From<HashMap<String, Val>> for Val {
    fn from(v: HashMap<String, Val>) -> Val {
        Val::Obj(v)
    }
}

impl From<ErrorInfo> for Val {
    fn from(v: ErrorInfo) -> Val {
        Val::Error(v)
    }
}
