//! Cooperative single-threaded scheduler
//!
//! Two thread-local queues drive every continuation in this crate: a FIFO
//! deferred-callback queue (the microtask-equivalent) and a coarser timer
//! queue ordered by virtual-clock deadline. The deferred queue is always
//! drained to exhaustion before the earliest timer fires, and again after
//! each timer callback returns.
//!
//! The clock is virtual: [`run_until_idle`] advances it straight to each
//! earliest deadline instead of sleeping, so timer-driven tests are
//! deterministic and instant.

pub mod timers;


pub use timers::{after, after_error, after_value};

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::rc::Rc;

use tracing::warn;
use uuid::Uuid;

use crate::value::Val;

type Callback = Box<dyn FnOnce()>;

type RejectionHook = Rc<dyn Fn(Uuid, &Val)>;

thread_local! {
    static SCHEDULER: RefCell<Scheduler> = RefCell::new(Scheduler::new());
}

/* ===================== Queues ===================== */

struct TimerEntry {
    fire_at: u64,
    seq: u64,
    callback: Callback,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest deadline, then the
        // earliest submission within a deadline, pops first.
        other
            .fire_at
            .cmp(&self.fire_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}

impl Eq for TimerEntry {}

struct Scheduler {
    deferred: VecDeque<Callback>,
    timers: BinaryHeap<TimerEntry>,
    now_ms: u64,
    timer_seq: u64,
    rejection_hook: Option<RejectionHook>,
}

impl Scheduler {
    fn new() -> Self {
        Scheduler {
            deferred: VecDeque::new(),
            timers: BinaryHeap::new(),
            now_ms: 0,
            timer_seq: 0,
            rejection_hook: None,
        }
    }
}

/* ===================== Public API ===================== */

/// Enqueue a callback on the deferred queue.
///
/// The callback runs once the current synchronous turn unwinds and the queue
/// drains to it, always before any timer callback.
pub fn enqueue(callback: impl FnOnce() + 'static) {
    SCHEDULER.with(|s| s.borrow_mut().deferred.push_back(Box::new(callback)));
}

/// Schedule a callback for `delay_ms` past the current virtual clock.
pub fn schedule_timer(delay_ms: u64, callback: impl FnOnce() + 'static) {
    SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        let entry = TimerEntry {
            fire_at: sched.now_ms + delay_ms,
            seq: sched.timer_seq,
            callback: Box::new(callback),
        };
        sched.timer_seq += 1;
        sched.timers.push(entry);
    });
}

/// Current virtual clock reading in milliseconds.
pub fn now_ms() -> u64 {
    SCHEDULER.with(|s| s.borrow().now_ms)
}

/// Run until both queues are empty
///
/// Drains the deferred queue completely, then fires the earliest timer
/// (advancing the virtual clock to its deadline), and repeats. Callbacks may
/// enqueue further work; it is picked up in the same run.
pub fn run_until_idle() {
    loop {
        while let Some(callback) = next_deferred() {
            callback();
        }
        match next_timer() {
            Some(callback) => callback(),
            None => break,
        }
    }
}

/// Install the observer called for rejections that settle with no registered
/// consumer. An environment-level concern: the deferred machinery itself
/// never treats an unobserved rejection as fatal.
pub fn set_unobserved_rejection_hook(hook: impl Fn(Uuid, &Val) + 'static) {
    SCHEDULER.with(|s| s.borrow_mut().rejection_hook = Some(Rc::new(hook)));
}

/// Remove the unobserved-rejection observer.
pub fn clear_unobserved_rejection_hook() {
    SCHEDULER.with(|s| s.borrow_mut().rejection_hook = None);
}

/* ===================== Crate Internals ===================== */

pub(crate) fn notify_unobserved_rejection(id: Uuid, reason: &Val) {
    warn!(%id, ?reason, "rejection settled with no registered consumer");
    let hook = SCHEDULER.with(|s| s.borrow().rejection_hook.clone());
    if let Some(hook) = hook {
        hook(id, reason);
    }
}

// Callbacks are popped under the borrow and run outside it, since they
// re-enter the scheduler to queue more work.
fn next_deferred() -> Option<Callback> {
    SCHEDULER.with(|s| s.borrow_mut().deferred.pop_front())
}

fn next_timer() -> Option<Callback> {
    SCHEDULER.with(|s| {
        let mut sched = s.borrow_mut();
        let entry = sched.timers.pop()?;
        sched.now_ms = sched.now_ms.max(entry.fire_at);
        Some(entry.callback)
    })
}
