//! Rolling gateway call statistics for service-status reporting.
//!
//! The session manager records every model-gateway outcome here. Counts
//! are windowed (one hour by default) so the status endpoint reports
//! *recent* success/failure activity rather than lifetime totals. Failures
//! are recorded regardless of quota refunds -- there are none -- so the
//! counters track downstream health independently of the rate limiter.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Event counter that only counts occurrences within a trailing window.
#[derive(Debug)]
pub struct RollingCounter {
    window: Duration,
    events: Mutex<VecDeque<Instant>>,
}

impl RollingCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// Record one event at the current instant.
    pub fn record(&self) {
        self.record_at(Instant::now());
    }

    fn record_at(&self, now: Instant) {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune(&mut events, now, self.window);
        events.push_back(now);
    }

    /// Events recorded within the trailing window.
    pub fn count(&self) -> u64 {
        let now = Instant::now();
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        Self::prune(&mut events, now, self.window);
        events.len() as u64
    }

    fn prune(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(front) = events.front() {
            if now.duration_since(*front) > window {
                events.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Point-in-time view of recent gateway activity.
#[derive(Debug, Clone, Serialize)]
pub struct GatewaySnapshot {
    pub recent_successes: u64,
    pub recent_failures: u64,
    pub last_error: Option<String>,
}

/// Success/failure tracking for the model gateway.
#[derive(Debug)]
pub struct GatewayStats {
    successes: RollingCounter,
    failures: RollingCounter,
    last_error: Mutex<Option<String>>,
}

impl GatewayStats {
    /// Stats with a one-hour rolling window.
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(3600))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            successes: RollingCounter::new(window),
            failures: RollingCounter::new(window),
            last_error: Mutex::new(None),
        }
    }

    pub fn record_success(&self) {
        self.successes.record();
    }

    pub fn record_failure(&self, error: &str) {
        self.failures.record();
        let mut last = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(error.to_string());
    }

    pub fn snapshot(&self) -> GatewaySnapshot {
        GatewaySnapshot {
            recent_successes: self.successes.count(),
            recent_failures: self.failures.count(),
            last_error: self
                .last_error
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}

impl Default for GatewayStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_counts_recent_events() {
        let counter = RollingCounter::new(Duration::from_secs(3600));
        assert_eq!(counter.count(), 0);
        counter.record();
        counter.record();
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn test_counter_prunes_expired_events() {
        let counter = RollingCounter::new(Duration::from_millis(0));
        counter.record();
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = GatewayStats::new();
        stats.record_success();
        stats.record_success();
        stats.record_failure("model endpoint unavailable: 503");

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.recent_successes, 2);
        assert_eq!(snapshot.recent_failures, 1);
        assert_eq!(
            snapshot.last_error.as_deref(),
            Some("model endpoint unavailable: 503")
        );
    }

    #[test]
    fn test_last_error_tracks_most_recent() {
        let stats = GatewayStats::new();
        stats.record_failure("first");
        stats.record_failure("second");
        assert_eq!(stats.snapshot().last_error.as_deref(), Some("second"));
    }
}
