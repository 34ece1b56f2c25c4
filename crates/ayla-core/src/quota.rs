//! Per-user fixed-window rate limiter.
//!
//! The window is anchored at the first request that opens it, not at the
//! wall-clock top of the hour, so all users do not reset in lockstep. The
//! check-and-increment is atomic per user: the `DashMap` entry guard holds
//! the shard write lock across the whole read-modify-write, so two racing
//! requests from the same user can never both be admitted past the limit.
//! Different users live on independent entries and never contend on the
//! same record.
//!
//! Consumption happens before the model gateway is invoked; a failed model
//! call does not refund quota.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use ayla_types::quota::{QuotaDecision, QuotaRecord, QuotaUsage};

/// Keyed store of per-user quota windows.
pub struct QuotaStore {
    windows: DashMap<Uuid, QuotaRecord>,
    window: Duration,
}

impl QuotaStore {
    /// Create a store with the given window length in seconds.
    pub fn new(window_secs: u64) -> Self {
        Self {
            windows: DashMap::new(),
            window: Duration::seconds(window_secs as i64),
        }
    }

    /// Atomically check the user's window and consume one request from it.
    pub fn check_and_consume(&self, user_id: Uuid, limit: u32) -> QuotaDecision {
        self.check_and_consume_at(user_id, limit, Utc::now())
    }

    /// Clock-injected variant of [`check_and_consume`](Self::check_and_consume)
    /// used by tests to exercise window rollover deterministically.
    pub fn check_and_consume_at(
        &self,
        user_id: Uuid,
        limit: u32,
        now: DateTime<Utc>,
    ) -> QuotaDecision {
        let mut entry = self.windows.entry(user_id).or_insert(QuotaRecord {
            window_start: now,
            count: 0,
        });
        let record = entry.value_mut();

        // Roll the window over atomically with this check.
        if now - record.window_start >= self.window {
            record.window_start = now;
            record.count = 0;
        }

        if record.count >= limit {
            let retry_after = (record.window_start + self.window - now)
                .num_seconds()
                .max(1) as u64;
            return QuotaDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs: retry_after,
            };
        }

        record.count += 1;
        QuotaDecision {
            allowed: true,
            remaining: limit - record.count,
            retry_after_secs: 0,
        }
    }

    /// Current-window usage for a user without consuming quota.
    pub fn usage(&self, user_id: Uuid, limit: u32) -> QuotaUsage {
        self.usage_at(user_id, limit, Utc::now())
    }

    /// Clock-injected variant of [`usage`](Self::usage).
    pub fn usage_at(&self, user_id: Uuid, limit: u32, now: DateTime<Utc>) -> QuotaUsage {
        match self.windows.get(&user_id) {
            Some(record) if now - record.window_start < self.window => QuotaUsage {
                used: record.count,
                limit,
                resets_in_secs: (record.window_start + self.window - now)
                    .num_seconds()
                    .max(0) as u64,
            },
            _ => QuotaUsage {
                used: 0,
                limit,
                resets_in_secs: 0,
            },
        }
    }
}
