//! The deferred value and its continuation registrar
//!
//! A [`Deferred`] is a cloneable handle over shared single-threaded state.
//! The handle carries both settlement capabilities; the first
//! `fulfill`/`reject` call wins and consumes them, every later call is a
//! silent no-op. Continuations registered through [`Deferred::then`] are
//! scheduled on the deferred queue, never invoked inline.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;
use uuid::Uuid;

use super::reaction::{Handler, Reaction, ReactionKind};
use super::state::DeferredState;
use crate::scheduler;
use crate::value::Val;

/* ===================== Settlement Input ===================== */

/// A value that may already exist or may still be deferred
///
/// Settlement input and combinator member type: plain values are treated as
/// already-fulfilled deferreds. The variant is checked once, at settlement
/// time, so a fulfilled payload is never itself a pending deferred.
pub enum Eventual {
    Value(Val),
    Deferred(Deferred),
}

impl Eventual {
    /// Wrap a plain value.
    pub fn value(v: impl Into<Val>) -> Eventual {
        Eventual::Value(v.into())
    }

    /// View as a deferred: plain values become already-fulfilled ones.
    pub fn into_deferred(self) -> Deferred {
        match self {
            Eventual::Value(v) => Deferred::fulfilled(v),
            Eventual::Deferred(dv) => dv,
        }
    }
}

impl From<Val> for Eventual {
    fn from(v: Val) -> Eventual {
        Eventual::Value(v)
    }
}

impl From<Deferred> for Eventual {
    fn from(dv: Deferred) -> Eventual {
        Eventual::Deferred(dv)
    }
}

/* ===================== Deferred ===================== */

/// Handle to a deferred value
///
/// Cloning shares the same underlying state. Once settled, the payload is
/// immutable and freely read by any number of holders.
#[derive(Clone)]
pub struct Deferred {
    inner: Rc<RefCell<Inner>>,
}

struct Inner {
    id: Uuid,
    state: DeferredState,
    value: Option<Val>,
    reason: Option<Val>,
    reactions: Vec<Reaction>,
    /// Settlement capability consumed. Set by the first fulfill/reject call,
    /// including a fulfill whose inner-deferred adoption is still in flight.
    resolved: bool,
    /// A continuation has been registered; rejection is someone's concern.
    observed: bool,
}

impl Deferred {
    /* ===================== Constructors ===================== */

    /// New deferred in the pending state.
    pub fn pending() -> Deferred {
        let dv = Deferred {
            inner: Rc::new(RefCell::new(Inner {
                id: Uuid::new_v4(),
                state: DeferredState::Pending,
                value: None,
                reason: None,
                reactions: Vec::new(),
                resolved: false,
                observed: false,
            })),
        };
        trace!(id = %dv.id(), "deferred created");
        dv
    }

    /// Construct via an executor, invoked synchronously with the settlement
    /// handle. An executor error rejects the deferred, unless the executor
    /// already settled it (first settlement wins).
    pub fn new<F>(executor: F) -> Deferred
    where
        F: FnOnce(&Deferred) -> Result<(), Val>,
    {
        let dv = Deferred::pending();
        if let Err(reason) = executor(&dv) {
            dv.reject(reason);
        }
        dv
    }

    /// Already-fulfilled deferred.
    pub fn fulfilled(value: impl Into<Val>) -> Deferred {
        let dv = Deferred::pending();
        dv.fulfill(value.into());
        dv
    }

    /// Already-rejected deferred.
    pub fn rejected(reason: impl Into<Val>) -> Deferred {
        let dv = Deferred::pending();
        dv.reject(reason);
        dv
    }

    /* ===================== Inspection ===================== */

    pub fn id(&self) -> Uuid {
        self.inner.borrow().id
    }

    pub fn state(&self) -> DeferredState {
        self.inner.borrow().state
    }

    /// The fulfilled payload; `None` unless fulfilled.
    pub fn value(&self) -> Option<Val> {
        self.inner.borrow().value.clone()
    }

    /// The rejection reason; `None` unless rejected.
    pub fn reason(&self) -> Option<Val> {
        self.inner.borrow().reason.clone()
    }

    /* ===================== Settlement ===================== */

    /// Settle as fulfilled. Returns whether this call took effect; a no-op
    /// once the capability is consumed.
    ///
    /// Fulfilling with another deferred does not store it as the value: this
    /// deferred stays pending and adopts the inner deferred's eventual state
    /// and payload, however many levels deep the chain goes.
    pub fn fulfill(&self, value: impl Into<Eventual>) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.resolved {
                return false;
            }
            inner.resolved = true;
        }
        match value.into() {
            Eventual::Value(v) => self.transition_fulfilled(v),
            Eventual::Deferred(dv) => {
                trace!(id = %self.id(), inner_id = %dv.id(), "adopting inner deferred");
                dv.adopt_into(self.clone());
            }
        }
        true
    }

    /// Settle as rejected. Returns whether this call took effect; a no-op
    /// once the capability is consumed. The reason is stored as-is, never
    /// flattened.
    pub fn reject(&self, reason: impl Into<Val>) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.resolved {
                return false;
            }
            inner.resolved = true;
        }
        self.transition_rejected(reason.into());
        true
    }

    /* ===================== Continuation Registrar ===================== */

    /// Register a continuation pair, returning the chained deferred.
    ///
    /// The chained deferred is returned immediately regardless of this one's
    /// state. Handlers never run inside the registering call: against a
    /// settled deferred the appropriate path is scheduled on the deferred
    /// queue; against a pending one the reaction fires, also deferred, at
    /// transition time. A missing fulfillment handler passes the value
    /// through; a missing rejection handler passes the rejection through.
    pub fn then(&self, on_fulfilled: Option<Handler>, on_rejected: Option<Handler>) -> Deferred {
        let chained = Deferred::pending();
        self.push_reaction(Reaction {
            kind: ReactionKind::Handlers {
                on_fulfilled,
                on_rejected,
            },
            target: chained.clone(),
        });
        chained
    }

    /// Rejection-only registrar: `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Handler) -> Deferred {
        self.then(None, Some(on_rejected))
    }

    /// Run `callback` once this deferred settles, either way. The chained
    /// deferred passes the original outcome through unchanged.
    pub fn finally(&self, callback: impl FnOnce() + 'static) -> Deferred {
        let chained = Deferred::pending();
        self.push_reaction(Reaction {
            kind: ReactionKind::Cleanup(Box::new(callback)),
            target: chained.clone(),
        });
        chained
    }

    /* ===================== Crate Internals ===================== */

    /// Make `target` adopt this deferred's eventual outcome (flattening).
    pub(crate) fn adopt_into(&self, target: Deferred) {
        self.push_reaction(Reaction::passthrough(target));
    }

    /// Queue a reaction, or schedule it right away on a settled deferred.
    pub(crate) fn push_reaction(&self, reaction: Reaction) {
        let mut fire: Option<(Reaction, Val, bool)> = None;
        {
            let mut inner = self.inner.borrow_mut();
            inner.observed = true;
            match inner.state {
                DeferredState::Pending => inner.reactions.push(reaction),
                DeferredState::Fulfilled => {
                    let value = inner.value.clone().unwrap_or(Val::Null);
                    fire = Some((reaction, value, false));
                }
                DeferredState::Rejected => {
                    let reason = inner.reason.clone().unwrap_or(Val::Null);
                    fire = Some((reaction, reason, true));
                }
            }
        }
        if let Some((reaction, payload, rejected)) = fire {
            scheduler::enqueue(move || {
                if rejected {
                    reaction.fire_rejected(payload);
                } else {
                    reaction.fire_fulfilled(payload);
                }
            });
        }
    }

    /// Transition to fulfilled. No-op if already terminal; every queued
    /// reaction is scheduled in registration order and the queue cleared.
    pub(crate) fn transition_fulfilled(&self, value: Val) {
        let reactions = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = DeferredState::Fulfilled;
            inner.value = Some(value.clone());
            std::mem::take(&mut inner.reactions)
        };
        trace!(id = %self.id(), reactions = reactions.len(), "deferred fulfilled");
        for reaction in reactions {
            let payload = value.clone();
            scheduler::enqueue(move || reaction.fire_fulfilled(payload));
        }
    }

    /// Transition to rejected. Same contract as `transition_fulfilled`; a
    /// rejection with no consumer is re-checked after the current drain and
    /// reported through the scheduler's observer hook.
    pub(crate) fn transition_rejected(&self, reason: Val) {
        let (reactions, unobserved) = {
            let mut inner = self.inner.borrow_mut();
            if inner.state.is_terminal() {
                return;
            }
            inner.state = DeferredState::Rejected;
            inner.reason = Some(reason.clone());
            (std::mem::take(&mut inner.reactions), !inner.observed)
        };
        trace!(id = %self.id(), reactions = reactions.len(), "deferred rejected");
        for reaction in reactions {
            let payload = reason.clone();
            scheduler::enqueue(move || reaction.fire_rejected(payload));
        }
        if unobserved {
            // A consumer registered before this probe drains marks the
            // rejection observed and suppresses the report.
            let probe = self.clone();
            scheduler::enqueue(move || {
                let inner = probe.inner.borrow();
                if !inner.observed {
                    if let Some(reason) = &inner.reason {
                        scheduler::notify_unobserved_rejection(inner.id, reason);
                    }
                }
            });
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        write!(
            f,
            "Deferred {{ id: {}, state: {:?}, reactions: {} }}",
            inner.id,
            inner.state,
            inner.reactions.len()
        )
    }
}
