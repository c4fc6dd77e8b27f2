//! Continuation reactions
//!
//! A reaction is one registered continuation: the optional handler pair (or
//! a cleanup callback) plus the chained deferred it must settle. Each
//! reaction is consumed by exactly one invocation, scheduled on the deferred
//! queue at transition time.

use super::handle::Deferred;
use crate::value::Val;

/// What a continuation handler produced
///
/// The chained deferred is settled from this: `Value` fulfills it, `Chain`
/// makes it adopt another deferred (flattening, recursively), `Throw`
/// rejects it.
pub enum ChainResult {
    Value(Val),
    Chain(Deferred),
    Throw(Val),
}

impl From<Val> for ChainResult {
    fn from(v: Val) -> ChainResult {
        ChainResult::Value(v)
    }
}

impl From<Deferred> for ChainResult {
    fn from(dv: Deferred) -> ChainResult {
        ChainResult::Chain(dv)
    }
}

/// Continuation handler: consumes the settled payload exactly once.
pub type Handler = Box<dyn FnOnce(Val) -> ChainResult>;

pub(crate) enum ReactionKind {
    /// then/catch registration. A missing handler passes the outcome through
    /// to the target unchanged, which is how rejections propagate silently
    /// past fulfillment-only links.
    Handlers {
        on_fulfilled: Option<Handler>,
        on_rejected: Option<Handler>,
    },
    /// finally registration: the callback runs on either outcome and the
    /// outcome passes through.
    Cleanup(Box<dyn FnOnce()>),
}

pub(crate) struct Reaction {
    pub kind: ReactionKind,
    pub target: Deferred,
}

impl Reaction {
    /// Reaction with no handlers: the target adopts the source's outcome.
    pub fn passthrough(target: Deferred) -> Reaction {
        Reaction {
            kind: ReactionKind::Handlers {
                on_fulfilled: None,
                on_rejected: None,
            },
            target,
        }
    }

    pub fn fire_fulfilled(self, value: Val) {
        let Reaction { kind, target } = self;
        match kind {
            ReactionKind::Handlers { on_fulfilled, .. } => match on_fulfilled {
                Some(handler) => settle_from(target, handler(value)),
                None => target.transition_fulfilled(value),
            },
            ReactionKind::Cleanup(cleanup) => {
                cleanup();
                target.transition_fulfilled(value);
            }
        }
    }

    pub fn fire_rejected(self, reason: Val) {
        let Reaction { kind, target } = self;
        match kind {
            ReactionKind::Handlers { on_rejected, .. } => match on_rejected {
                Some(handler) => settle_from(target, handler(reason)),
                None => target.transition_rejected(reason),
            },
            ReactionKind::Cleanup(cleanup) => {
                cleanup();
                target.transition_rejected(reason);
            }
        }
    }
}

/// Settle `target` from what a handler returned.
fn settle_from(target: Deferred, result: ChainResult) {
    match result {
        ChainResult::Value(v) => target.transition_fulfilled(v),
        ChainResult::Chain(dv) => dv.adopt_into(target),
        ChainResult::Throw(e) => target.transition_rejected(e),
    }
}
