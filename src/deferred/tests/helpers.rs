//! Test helpers for deferred tests
//!
//! Shared probes for observing handler invocations without settling
//! anything ourselves.

use std::cell::RefCell;
use std::rc::Rc;

use crate::deferred::{ChainResult, Handler};
use crate::value::Val;

/// Shared log of payloads observed by probe handlers.
pub type Seen = Rc<RefCell<Vec<Val>>>;

pub fn seen() -> Seen {
    Rc::new(RefCell::new(Vec::new()))
}

/// Handler that records the payload it was invoked with and passes it on.
pub fn record(seen: &Seen) -> Handler {
    let seen = seen.clone();
    Box::new(move |value| {
        seen.borrow_mut().push(value.clone());
        ChainResult::Value(value)
    })
}

/// Install the fmt subscriber once so RUST_LOG surfaces transition traces.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
