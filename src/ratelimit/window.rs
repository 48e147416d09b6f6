// Sliding-window log rate limiter for the public write endpoints.
//
// Each identifier (usually a client IP) owns a queue of the epoch-ms
// timestamps of its accepted requests. A check prunes everything at or
// before `now - interval`, then either rejects (window full) or appends
// `now`. The window boundary moves continuously with the clock, so a burst
// straddling a bucket edge can't double the effective rate the way a
// fixed-bucket counter allows.
//
// The store lives for the lifetime of the process and is never persisted.
// Distinct identifiers accumulate until `cleanup()` runs, so long-running
// servers call it periodically (see `sweeper.rs`).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;

/// How far back `cleanup()` keeps timestamps. Every window in use is far
/// shorter than this.
pub const CLEANUP_HORIZON: Duration = Duration::from_secs(60 * 60);

/// Outcome of a single rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    /// True when the request was admitted and recorded.
    pub success: bool,
    /// The quota the request was checked against.
    pub limit: u32,
    /// Requests still available in the current window (0 on rejection).
    pub remaining: u32,
    /// Epoch milliseconds at which the window next admits a request.
    pub reset_at: i64,
}

/// An in-process sliding-window log, keyed by client identifier.
///
/// Thread-safe via interior mutability: the prune-check-append sequence runs
/// under one mutex, so concurrent checks for the same identifier never see a
/// stale count.
#[derive(Debug, Default)]
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, VecDeque<i64>>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check (and, if admitted, record) a request for `identifier` against
    /// the wall clock.
    pub fn check(&self, identifier: &str, interval: Duration, max_requests: u32) -> RateLimitDecision {
        self.check_at(identifier, interval, max_requests, now_millis())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading in epoch
    /// milliseconds.
    ///
    /// With `max_requests == 0` every call is rejected and `reset_at` is
    /// `now + interval`.
    pub fn check_at(
        &self,
        identifier: &str,
        interval: Duration,
        max_requests: u32,
        now_ms: i64,
    ) -> RateLimitDecision {
        let interval_ms = duration_millis(interval);
        let window_start = now_ms.saturating_sub(interval_ms);

        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let timestamps = windows.entry(identifier.to_string()).or_default();

        while timestamps.front().is_some_and(|&t| t <= window_start) {
            timestamps.pop_front();
        }

        let count = timestamps.len() as u64;
        if count >= u64::from(max_requests) {
            let reset_at = timestamps
                .front()
                .map(|&oldest| oldest.saturating_add(interval_ms))
                .unwrap_or(now_ms.saturating_add(interval_ms));
            return RateLimitDecision {
                success: false,
                limit: max_requests,
                remaining: 0,
                reset_at,
            };
        }

        timestamps.push_back(now_ms);
        RateLimitDecision {
            success: true,
            limit: max_requests,
            remaining: max_requests - timestamps.len() as u32,
            reset_at: now_ms.saturating_add(interval_ms),
        }
    }

    /// Drop timestamps older than [`CLEANUP_HORIZON`] and forget identifiers
    /// left with none. Returns how many identifiers were removed.
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(now_millis())
    }

    /// [`cleanup`](Self::cleanup) with an explicit clock reading.
    pub fn cleanup_at(&self, now_ms: i64) -> usize {
        let cutoff = now_ms.saturating_sub(duration_millis(CLEANUP_HORIZON));
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();

        windows.retain(|_, timestamps| {
            while timestamps.front().is_some_and(|&t| t <= cutoff) {
                timestamps.pop_front();
            }
            !timestamps.is_empty()
        });

        before - windows.len()
    }

    /// Number of identifiers currently holding state.
    pub fn tracked_identifiers(&self) -> usize {
        self.windows.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn duration_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn test_first_request_is_admitted() {
        let limiter = SlidingWindowLimiter::new();
        let decision = limiter.check_at("1.2.3.4", MINUTE, 5, 1_000);

        assert!(decision.success);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.limit, 5);
        assert_eq!(decision.reset_at, 61_000);
    }

    #[test]
    fn test_remaining_counts_down() {
        let limiter = SlidingWindowLimiter::new();
        let remaining: Vec<u32> = (0..3)
            .map(|i| limiter.check_at("ip", MINUTE, 3, 1_000 + i).remaining)
            .collect();
        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[test]
    fn test_rejection_does_not_record() {
        let limiter = SlidingWindowLimiter::new();
        limiter.check_at("ip", MINUTE, 1, 0);
        for t in 1..10 {
            assert!(!limiter.check_at("ip", MINUTE, 1, t).success);
        }
        // Only the admitted request counts, so the window frees at 60_000.
        assert!(limiter.check_at("ip", MINUTE, 1, 60_000).success);
    }

    #[test]
    fn test_timestamp_exactly_on_window_start_is_pruned() {
        let limiter = SlidingWindowLimiter::new();
        assert!(limiter.check_at("ip", MINUTE, 1, 0).success);
        assert!(!limiter.check_at("ip", MINUTE, 1, 59_999).success);
        // window_start == 0 and the stored 0 is <= window_start
        assert!(limiter.check_at("ip", MINUTE, 1, 60_000).success);
    }

    #[test]
    fn test_zero_quota_always_rejects() {
        let limiter = SlidingWindowLimiter::new();
        let decision = limiter.check_at("ip", MINUTE, 0, 5_000);
        assert!(!decision.success);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.reset_at, 65_000);
    }

    #[test]
    fn test_huge_interval_saturates() {
        let limiter = SlidingWindowLimiter::new();
        let forever = Duration::from_secs(u64::MAX);

        let first = limiter.check_at("ip", forever, 1, 1_000);
        assert!(first.success);
        assert_eq!(first.reset_at, i64::MAX);

        let second = limiter.check_at("ip", forever, 1, 2_000);
        assert!(!second.success);
        assert_eq!(second.reset_at, i64::MAX);
    }

    #[test]
    fn test_cleanup_drops_idle_identifiers() {
        let limiter = SlidingWindowLimiter::new();
        limiter.check_at("old", MINUTE, 10, 0);
        limiter.check_at("fresh", MINUTE, 10, 3_000_000);

        let removed = limiter.cleanup_at(3_700_000);
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_identifiers(), 1);
    }

    #[test]
    fn test_cleanup_on_empty_store() {
        let limiter = SlidingWindowLimiter::new();
        assert_eq!(limiter.cleanup(), 0);
        assert_eq!(limiter.cleanup(), 0);
    }
}
