//! Deferred lifecycle state

use serde::{Deserialize, Serialize};

/// Lifecycle state of a deferred value
///
/// Monotonic: once `Fulfilled` or `Rejected`, the state never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeferredState {
    Pending,
    Fulfilled,
    Rejected,
}

impl DeferredState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeferredState::Pending)
    }
}
