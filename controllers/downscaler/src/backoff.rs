//! # Fibonacci Backoff
//!
//! Retry delays for Downscalers whose scaling run failed.
//! The delay grows along the Fibonacci sequence from a minimum to a cap
//! (with the defaults: 1m, 1m, 2m, 3m, 5m, 8m, 10m) and resets on success.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a backoff starting at `min` and capped at `max`
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev + self.current;
        self.prev = self.current;
        self.current = std::cmp::min(next, self.max);
        result
    }
}

#[derive(Debug)]
struct BackoffEntry {
    backoff: FibonacciBackoff,
    retry_at: Instant,
}

/// Per-Downscaler retry gate
#[derive(Debug)]
pub struct BackoffTracker {
    min: Duration,
    max: Duration,
    entries: HashMap<String, BackoffEntry>,
}

impl BackoffTracker {
    /// Create a tracker whose backoffs run from `min` to `max`
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            entries: HashMap::new(),
        }
    }

    /// Whether `name` is still waiting out a previous failure
    pub fn is_waiting(&self, name: &str, now: Instant) -> bool {
        self.entries.get(name).is_some_and(|entry| now < entry.retry_at)
    }

    /// Record a failure and return the delay before the next attempt
    pub fn record_failure(&mut self, name: &str, now: Instant) -> Duration {
        let (min, max) = (self.min, self.max);
        let entry = self.entries.entry(name.to_string()).or_insert_with(|| BackoffEntry {
            backoff: FibonacciBackoff::new(min, max),
            retry_at: now,
        });
        let delay = entry.backoff.next_backoff();
        entry.retry_at = now + delay;
        delay
    }

    /// Forget any failure history for `name`
    pub fn record_success(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Drop entries for Downscalers that no longer exist
    pub fn retain<F: Fn(&str) -> bool>(&mut self, keep: F) {
        self.entries.retain(|name, _| keep(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minutes(m: u64) -> Duration {
        Duration::from_secs(m * 60)
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(minutes(1), minutes(10));

        // 1m, 1m, 2m, 3m, 5m, 8m, 10m (max)
        assert_eq!(backoff.next_backoff(), minutes(1));
        assert_eq!(backoff.next_backoff(), minutes(1));
        assert_eq!(backoff.next_backoff(), minutes(2));
        assert_eq!(backoff.next_backoff(), minutes(3));
        assert_eq!(backoff.next_backoff(), minutes(5));
        assert_eq!(backoff.next_backoff(), minutes(8));
        assert_eq!(backoff.next_backoff(), minutes(10));
        // Next would be 13m, capped at 10m
        assert_eq!(backoff.next_backoff(), minutes(10));
    }

    #[test]
    fn test_tracker_gates_until_retry_time() {
        let mut tracker = BackoffTracker::new(minutes(1), minutes(10));
        let start = Instant::now();

        assert!(!tracker.is_waiting("office-hours", start));
        assert_eq!(tracker.record_failure("office-hours", start), minutes(1));
        assert!(tracker.is_waiting("office-hours", start + Duration::from_secs(30)));
        assert!(!tracker.is_waiting("office-hours", start + minutes(1)));
        assert!(!tracker.is_waiting("other", start));

        let later = start + minutes(1);
        assert_eq!(tracker.record_failure("office-hours", later), minutes(1));
        assert_eq!(tracker.record_failure("office-hours", later + minutes(1)), minutes(2));

        tracker.record_success("office-hours");
        assert!(!tracker.is_waiting("office-hours", later));
        assert_eq!(tracker.record_failure("office-hours", later), minutes(1));
    }

    #[test]
    fn test_tracker_retain() {
        let mut tracker = BackoffTracker::new(minutes(1), minutes(10));
        let now = Instant::now();
        tracker.record_failure("kept", now);
        tracker.record_failure("gone", now);
        tracker.retain(|name| name == "kept");
        assert!(tracker.is_waiting("kept", now));
        assert!(!tracker.is_waiting("gone", now));
    }
}
