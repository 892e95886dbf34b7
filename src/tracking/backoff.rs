//! Exponential backoff for distance provider failures.

use std::time::Duration;

use tokio::time::Instant;

/// Doubling backoff, capped at a maximum interval.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tokio::time::Instant;
/// use u_fleet::tracking::Backoff;
///
/// let mut b = Backoff::new(Duration::from_secs(1), Duration::from_secs(5));
/// let now = Instant::now();
/// assert_eq!(b.record_failure(now), Duration::from_secs(1));
/// assert_eq!(b.record_failure(now), Duration::from_secs(2));
/// assert_eq!(b.record_failure(now), Duration::from_secs(4));
/// assert_eq!(b.record_failure(now), Duration::from_secs(5));
/// assert!(b.is_active(now));
/// b.reset();
/// assert!(!b.is_active(now));
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    failures: u32,
    until: Option<Instant>,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            failures: 0,
            until: None,
        }
    }

    /// `true` while checks should be skipped.
    pub fn is_active(&self, now: Instant) -> bool {
        self.until.is_some_and(|t| now < t)
    }

    /// Records a failure at `now` and returns the pause it starts.
    pub fn record_failure(&mut self, now: Instant) -> Duration {
        let shift = self.failures.min(31);
        self.failures = self.failures.saturating_add(1);
        let delay = self
            .base
            .checked_mul(1u32 << shift)
            .map_or(self.max, |d| d.min(self.max));
        self.until = Some(now + delay);
        delay
    }

    /// Clears the failure count after a successful call.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.until = None;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}
