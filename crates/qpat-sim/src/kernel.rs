//! Discrete-event timeline.
//!
//! The simulation only needs three primitives from its clock: schedule an
//! action at time `T`, pop due actions in time order up to a stop time, and
//! read the current time. Ties at an identical time are broken FIFO by
//! scheduling order so runs with the same seed are reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{SimError, SimResult};

/// Simulation time in picoseconds.
pub type Picoseconds = u64;

/// Picoseconds per second.
pub const PS_PER_SECOND: f64 = 1e12;

/// Convert seconds to whole picoseconds.
pub fn seconds_to_ps(seconds: f64) -> Picoseconds {
    (seconds * PS_PER_SECOND).round().max(0.0) as Picoseconds
}

struct Entry<A> {
    time: Picoseconds,
    seq: u64,
    action: A,
}

impl<A> PartialEq for Entry<A> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl<A> Eq for Entry<A> {}

impl<A> PartialOrd for Entry<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Entry<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: earliest time, then earliest seq, wins.
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Time-ordered action queue with a monotonic clock.
pub struct Timeline<A> {
    queue: BinaryHeap<Entry<A>>,
    now: Picoseconds,
    stop_time: Picoseconds,
    seq: u64,
    executed: u64,
}

impl<A> Default for Timeline<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Timeline<A> {
    /// Create an empty timeline at time zero with no stop time.
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            now: 0,
            stop_time: Picoseconds::MAX,
            seq: 0,
            executed: 0,
        }
    }

    /// Current simulation time.
    pub fn now(&self) -> Picoseconds {
        self.now
    }

    /// Configured stop time.
    pub fn stop_time(&self) -> Picoseconds {
        self.stop_time
    }

    /// Set the time after which [`pop_due`](Self::pop_due) stops yielding.
    pub fn set_stop_time(&mut self, stop_time: Picoseconds) {
        self.stop_time = stop_time;
    }

    /// Schedule an action; times before `now` are rejected.
    pub fn schedule(&mut self, time: Picoseconds, action: A) -> SimResult<()> {
        if time < self.now {
            return Err(SimError::ScheduleInPast {
                time,
                now: self.now,
            });
        }
        self.queue.push(Entry {
            time,
            seq: self.seq,
            action,
        });
        self.seq += 1;
        Ok(())
    }

    /// Pop the next action due at or before the stop time, advancing `now`.
    pub fn pop_due(&mut self) -> Option<(Picoseconds, A)> {
        if self.queue.peek()?.time > self.stop_time {
            return None;
        }
        let entry = self.queue.pop()?;
        self.now = entry.time;
        self.executed += 1;
        Some((entry.time, entry.action))
    }

    /// Number of actions still queued.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of actions popped so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }
}
