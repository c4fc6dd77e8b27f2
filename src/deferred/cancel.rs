//! Cancelable deferreds
//!
//! Cancellation is an external collaborator of the core primitive, not part
//! of it: the handle holds the ordinary rejection capability plus any
//! cleanup closures the executor registered, and loses to whatever
//! settlement happens first.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::handle::Deferred;
use crate::errors::{self, ErrorInfo};
use crate::value::Val;

type Cleanup = Box<dyn FnOnce()>;

/// Registers cleanup closures to run if the deferred is canceled.
#[derive(Clone)]
pub struct CancelScope {
    cleanups: Rc<RefCell<Vec<Cleanup>>>,
}

impl CancelScope {
    pub fn on_cancel(&self, cleanup: impl FnOnce() + 'static) {
        self.cleanups.borrow_mut().push(Box::new(cleanup));
    }
}

/// External cancel capability for a deferred produced by [`cancelable`].
pub struct CancelHandle {
    target: Deferred,
    cleanups: Rc<RefCell<Vec<Cleanup>>>,
}

impl CancelHandle {
    /// Reject the deferred with a `Canceled` error and run registered
    /// cleanups. A no-op if the deferred already settled (or an adoption is
    /// in flight) and on repeat calls: first settlement wins.
    pub fn cancel(&self) {
        let canceled = self
            .target
            .reject(Val::Error(ErrorInfo::new(errors::CANCELED, "deferred canceled")));
        if !canceled {
            return;
        }
        debug!(id = %self.target.id(), "deferred canceled");
        for cleanup in self.cleanups.borrow_mut().drain(..) {
            cleanup();
        }
    }
}

/// Create a cancelable deferred
///
/// The executor receives the settlement handle and a [`CancelScope`] for
/// registering cleanup closures. Returns the deferred and the cancel
/// capability for whoever supervises it.
pub fn cancelable<F>(executor: F) -> (Deferred, CancelHandle)
where
    F: FnOnce(&Deferred, &CancelScope) -> Result<(), Val>,
{
    let scope = CancelScope {
        cleanups: Rc::new(RefCell::new(Vec::new())),
    };
    let dv = Deferred::new(|handle| executor(handle, &scope));
    let handle = CancelHandle {
        target: dv.clone(),
        cleanups: scope.cleanups.clone(),
    };
    (dv, handle)
}
