//! Fixed-window counter entry.

use std::time::{Duration, Instant};

/// State for one `(category, identifier)` pair within the current window.
///
/// This is a fixed-window counter: the count resets to zero at window
/// boundaries rather than decaying continuously. A burst of `max` requests
/// at the end of one window followed by `max` more at the start of the next
/// is allowed. That trade-off is intentional and observable; callers rely
/// on it, so it must not be swapped for sliding-window semantics.
#[derive(Debug, Clone)]
pub struct WindowEntry {
    /// Requests admitted in the current window
    count: u32,
    /// When the current window ends
    reset_at: Instant,
}

impl WindowEntry {
    /// Start a fresh window beginning at `now`.
    pub fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 0,
            reset_at: now + window,
        }
    }

    /// Whether the current window has ended.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.reset_at
    }

    /// Restart the window: zero the count and schedule a new boundary.
    pub fn restart(&mut self, now: Instant, window: Duration) {
        self.count = 0;
        self.reset_at = now + window;
    }

    /// Try to admit one request against `max`.
    ///
    /// Increments the count only on admission; a refused request leaves the
    /// count untouched.
    pub fn admit(&mut self, max: u32) -> bool {
        if self.count < max {
            self.count += 1;
            true
        } else {
            false
        }
    }

    /// Requests admitted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Quota left in the current window.
    pub fn remaining(&self, max: u32) -> u32 {
        max.saturating_sub(self.count)
    }

    /// When the current window ends.
    pub fn reset_at(&self) -> Instant {
        self.reset_at
    }

    /// Whole seconds until the window ends, rounded up.
    ///
    /// Zero only when `now` is already at or past the boundary.
    pub fn retry_after(&self, now: Instant) -> u64 {
        let until_reset = self.reset_at.saturating_duration_since(now);
        let secs = until_reset.as_secs();
        if until_reset.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_within_limit() {
        let now = Instant::now();
        let mut entry = WindowEntry::new(now, Duration::from_secs(60));

        assert!(entry.admit(10));
        assert_eq!(entry.count(), 1);
        assert_eq!(entry.remaining(10), 9);
    }

    #[test]
    fn test_admit_exceeds_limit() {
        let now = Instant::now();
        let mut entry = WindowEntry::new(now, Duration::from_secs(60));

        for _ in 0..5 {
            assert!(entry.admit(5));
        }

        // The 6th request is refused and does not bump the count.
        assert!(!entry.admit(5));
        assert_eq!(entry.count(), 5);
        assert_eq!(entry.remaining(5), 0);
    }

    #[test]
    fn test_expiry_and_restart() {
        let now = Instant::now();
        let window = Duration::from_millis(100);
        let mut entry = WindowEntry::new(now, window);

        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + window));

        entry.admit(1);
        entry.restart(now + window, window);
        assert_eq!(entry.count(), 0);
        assert_eq!(entry.reset_at(), now + window * 2);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let now = Instant::now();
        let entry = WindowEntry::new(now, Duration::from_millis(1500));

        assert_eq!(entry.retry_after(now), 2);
        assert_eq!(entry.retry_after(now + Duration::from_millis(500)), 1);
        assert_eq!(entry.retry_after(now + Duration::from_millis(1500)), 0);
        // Past the boundary saturates to zero rather than underflowing.
        assert_eq!(entry.retry_after(now + Duration::from_secs(10)), 0);
    }

    #[test]
    fn test_retry_after_exact_seconds() {
        let now = Instant::now();
        let entry = WindowEntry::new(now, Duration::from_secs(60));

        assert_eq!(entry.retry_after(now), 60);
    }
}
