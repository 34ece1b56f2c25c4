//! Per-user rate-limit types.
//!
//! The quota store keeps one [`QuotaRecord`] per user: a fixed-length
//! window anchored at the first request of that window, plus the number of
//! requests accepted inside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling request count for a single user's current window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaRecord {
    /// Start of the current window (timestamp of its first request).
    pub window_start: DateTime<Utc>,
    /// Requests accepted in the current window. Never exceeds the limit.
    pub count: u32,
}

/// Result of a check-and-consume call against the quota store.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    /// Requests left in the current window after this decision.
    pub remaining: u32,
    /// Seconds until the window resets. Zero when `allowed` and the window
    /// was freshly opened.
    pub retry_after_secs: u64,
}

/// Current-window usage for status reporting. Does not consume quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u32,
    pub limit: u32,
    /// Seconds until the current window resets; zero when no window is open.
    pub resets_in_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_decision_serde() {
        let decision = QuotaDecision {
            allowed: false,
            remaining: 0,
            retry_after_secs: 1800,
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"allowed\":false"));
        assert!(json.contains("\"retry_after_secs\":1800"));
    }

    #[test]
    fn test_quota_record_roundtrip() {
        let record = QuotaRecord {
            window_start: Utc::now(),
            count: 7,
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: QuotaRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.count, 7);
    }
}
