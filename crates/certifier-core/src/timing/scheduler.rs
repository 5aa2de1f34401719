//! Run-tagged deferred actions
//!
//! A session schedules its checks as `(run, deadline, action)` entries. Every
//! entry carries the [`RunId`] of the run that scheduled it, so a restarted
//! session can discard whatever an earlier run left behind.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one session run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RunId(pub u64);

impl RunId {
    /// The identifier following this one
    pub fn next(self) -> Self {
        RunId(self.0 + 1)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// A pending action
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledAction<A> {
    /// Run that scheduled the action
    pub run: RunId,
    /// Deadline in the scheduler time base (ms)
    pub due_at: f64,
    /// The action itself
    pub action: A,
    seq: u64,
}

/// Deadline-ordered queue of deferred actions
///
/// Entries fire in deadline order; entries sharing a deadline fire in the
/// order they were scheduled.
///
/// # Example
/// ```
/// use certifier_core::timing::scheduler::{RunId, TimerQueue};
///
/// let mut queue = TimerQueue::new();
/// queue.schedule(RunId(1), 500.0, "early");
/// queue.schedule(RunId(1), 100.0, "first");
///
/// let due: Vec<_> = queue.pop_due(500.0).into_iter().map(|a| a.action).collect();
/// assert_eq!(due, vec!["first", "early"]);
/// ```
#[derive(Debug, Clone)]
pub struct TimerQueue<A> {
    entries: Vec<ScheduledAction<A>>,
    next_seq: u64,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerQueue<A> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Schedule `action` for `run` at the absolute deadline `due_at`
    pub fn schedule(&mut self, run: RunId, due_at: f64, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ScheduledAction {
            run,
            due_at,
            action,
            seq,
        });
    }

    /// Remove and return every entry due at or before `now`, in firing order
    pub fn pop_due(&mut self, now: f64) -> Vec<ScheduledAction<A>> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|e| e.due_at <= now);
        self.entries = pending;
        due.sort_by(|a, b| a.due_at.total_cmp(&b.due_at).then(a.seq.cmp(&b.seq)));
        due
    }

    /// Drop every entry scheduled by a run other than `run`
    ///
    /// Returns the number of entries dropped.
    pub fn retain_run(&mut self, run: RunId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.run == run);
        before - self.entries.len()
    }

    /// Drop every entry scheduled by `run`
    pub fn cancel_run(&mut self, run: RunId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.run != run);
        before - self.entries.len()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<f64> {
        self.entries.iter().map(|e| e.due_at).min_by(f64::total_cmp)
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
