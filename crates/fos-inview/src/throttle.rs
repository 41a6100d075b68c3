//! Throttle
//!
//! Leading and trailing edge rate limiting. The first call in a quiet period
//! runs immediately; calls during the interval collapse into a single
//! trailing run once the interval has elapsed.

use std::time::{Duration, Instant};

/// Default check interval
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Throttle state for one function
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn window_open(&self, now: Instant) -> bool {
        match self.last_run {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    /// Request a run. Returns true if the caller should run now.
    pub fn call(&mut self, now: Instant) -> bool {
        if self.window_open(now) {
            self.last_run = Some(now);
            self.pending = false;
            true
        } else {
            self.pending = true;
            false
        }
    }

    /// Returns true if a deferred run is due at `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.pending && self.window_open(now) {
            self.last_run = Some(now);
            self.pending = false;
            true
        } else {
            false
        }
    }

    /// When the deferred run becomes due, if there is one
    ///
    /// `None` as well when the deadline is beyond what `Instant` can represent.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.pending {
            return None;
        }
        self.last_run.and_then(|last| last.checked_add(self.interval))
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_leading_edge() {
        let start = Instant::now();
        let mut throttle = Throttle::default();

        assert!(throttle.call(start));
        assert!(!throttle.is_pending());
        assert_eq!(throttle.deadline(), None);
    }

    #[test]
    fn test_burst_collapses_to_one_trailing_run() {
        let start = Instant::now();
        let mut throttle = Throttle::new(ms(100));

        assert!(throttle.call(start));
        assert!(!throttle.call(start + ms(10)));
        assert!(!throttle.call(start + ms(20)));
        assert!(!throttle.call(start + ms(90)));
        assert_eq!(throttle.deadline(), Some(start + ms(100)));

        assert!(!throttle.poll(start + ms(99)));
        assert!(throttle.poll(start + ms(100)));
        assert!(!throttle.poll(start + ms(150)));
    }

    #[test]
    fn test_at_most_one_run_per_window() {
        let start = Instant::now();
        let mut throttle = Throttle::new(ms(100));
        let mut runs = Vec::new();

        for step in 0..50u64 {
            let now = start + ms(step * 10);
            if throttle.call(now) || throttle.poll(now) {
                runs.push(step * 10);
            }
        }

        for pair in runs.windows(2) {
            assert!(pair[1] - pair[0] >= 100);
        }
        assert_eq!(runs.len(), 5);
    }

    #[test]
    fn test_unbounded_interval_has_no_deadline() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::MAX);

        assert!(throttle.call(start));
        assert!(!throttle.call(start + ms(1)));
        assert!(throttle.is_pending());
        assert_eq!(throttle.deadline(), None);
        assert!(!throttle.poll(start + ms(1000)));
    }

    #[test]
    fn test_call_after_quiet_period_runs_immediately() {
        let start = Instant::now();
        let mut throttle = Throttle::new(ms(50));

        assert!(throttle.call(start));
        assert!(throttle.call(start + ms(60)));
    }
}
