//! Idle deadline for cooperative background work.

use web_time::{Duration, Instant};

/// Deadline handed to idle-time work by the host scheduler.
///
/// Work polls [`IdleDeadline::expired`] between units and yields when the
/// deadline passes; this is cooperative preemption by polling, not true
/// concurrency.
#[derive(Clone, Copy, Debug)]
pub struct IdleDeadline {
    deadline: Instant,
}

impl IdleDeadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            deadline: Instant::now() + budget,
        }
    }

    /// A deadline at an absolute instant.
    pub fn at(deadline: Instant) -> Self {
        Self { deadline }
    }

    /// Time left before the deadline, zero once passed.
    pub fn time_remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// True once the deadline has passed.
    #[inline]
    pub fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}
