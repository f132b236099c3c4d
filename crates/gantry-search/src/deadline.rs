use std::time::{Duration, Instant};

/// A wall-clock budget measured from a shared start instant.
///
/// Several deadlines may share one start, so that a later stage's budget
/// still counts the time spent by earlier stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(start: Instant, budget: Duration) -> Self {
        Self { start, budget }
    }

    /// A deadline starting now.
    pub fn after(budget: Duration) -> Self {
        Self::new(Instant::now(), budget)
    }

    /// A deadline that never expires in practice.
    pub fn unlimited() -> Self {
        Self::after(Duration::MAX)
    }

    #[inline]
    pub fn start(&self) -> Instant {
        self.start
    }

    #[inline]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Whether the budget is spent. A zero budget is always expired.
    #[inline]
    pub fn expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }
}
