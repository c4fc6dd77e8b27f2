//! Concurrency-limited producer pool

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::debug;

use super::Producer;
use crate::deferred::{ChainResult, Deferred};
use crate::errors::CadenceError;
use crate::value::Val;

/// Runs producers with at most `limit` in flight
///
/// Excess submissions queue in order and start as running producers settle.
/// Each submission gets its own deferred, settled with that producer's
/// outcome; one producer failing does not disturb the others.
pub struct Pool {
    inner: Rc<RefCell<PoolInner>>,
}

struct PoolInner {
    limit: usize,
    running: usize,
    queue: VecDeque<(Producer, Deferred)>,
}

impl Pool {
    pub fn new(limit: usize) -> Result<Pool, CadenceError> {
        if limit == 0 {
            return Err(CadenceError::ZeroPoolLimit);
        }
        Ok(Pool {
            inner: Rc::new(RefCell::new(PoolInner {
                limit,
                running: 0,
                queue: VecDeque::new(),
            })),
        })
    }

    /// Submit a producer; the returned deferred settles with its outcome.
    pub fn add(&self, producer: Producer) -> Deferred {
        let target = Deferred::pending();
        self.inner
            .borrow_mut()
            .queue
            .push_back((producer, target.clone()));
        run_next(&self.inner);
        target
    }

    /// Producers currently in flight.
    pub fn running(&self) -> usize {
        self.inner.borrow().running
    }

    /// Submissions waiting for a slot.
    pub fn queued(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

fn run_next(pool: &Rc<RefCell<PoolInner>>) {
    let (mut producer, target) = {
        let mut inner = pool.borrow_mut();
        if inner.running >= inner.limit {
            return;
        }
        match inner.queue.pop_front() {
            Some(entry) => {
                inner.running += 1;
                entry
            }
            None => return,
        }
    };

    debug!("pool slot claimed");
    let dv = match producer() {
        Ok(dv) => dv,
        Err(reason) => {
            target.reject(reason);
            release(pool.clone());
            return;
        }
    };

    let on_value = (target.clone(), pool.clone());
    let on_error = (target, pool.clone());
    dv.then(
        Some(Box::new(move |value| {
            let (target, pool) = on_value;
            target.fulfill(value);
            release(pool);
            ChainResult::Value(Val::Null)
        })),
        Some(Box::new(move |reason| {
            let (target, pool) = on_error;
            target.reject(reason);
            release(pool);
            ChainResult::Value(Val::Null)
        })),
    );
}

fn release(pool: Rc<RefCell<PoolInner>>) {
    pool.borrow_mut().running -= 1;
    run_next(&pool);
}
