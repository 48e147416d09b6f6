// Sliding-window limiter tests: admission, sliding, reset times, cleanup.
//
// Every test drives the clock explicitly through check_at / cleanup_at so
// nothing depends on wall-clock timing.

use std::sync::Arc;
use std::time::Duration;

use grudge::ratelimit::{
    EndpointLimiter, EndpointLimits, RateLimitPolicy, SlidingWindowLimiter, CLEANUP_HORIZON,
};

const MINUTE: Duration = Duration::from_secs(60);
const T0: i64 = 1_700_000_000_000;

// ============================================================
// Admission
// ============================================================

#[test]
fn admits_exactly_max_requests_then_rejects() {
    let limiter = SlidingWindowLimiter::new();

    for i in 0..10u32 {
        let decision = limiter.check_at("1.2.3.4", MINUTE, 10, T0 + i as i64);
        assert!(decision.success, "request {} should be admitted", i + 1);
        assert_eq!(decision.limit, 10);
        assert_eq!(decision.remaining, 10 - (i + 1));
    }

    let eleventh = limiter.check_at("1.2.3.4", MINUTE, 10, T0 + 10);
    assert!(!eleventh.success);
    assert_eq!(eleventh.remaining, 0);
    assert_eq!(eleventh.limit, 10);
}

#[test]
fn rejected_requests_are_not_recorded() {
    let limiter = SlidingWindowLimiter::new();
    for i in 0..3 {
        limiter.check_at("ip", MINUTE, 3, T0 + i);
    }
    // Hammering while limited must not extend the lockout.
    for i in 0..50 {
        assert!(!limiter.check_at("ip", MINUTE, 3, T0 + 1_000 + i).success);
    }
    // The first timestamp (T0) leaves the window at T0 + 60_000 exactly.
    assert!(limiter.check_at("ip", MINUTE, 3, T0 + 60_000).success);
}

#[test]
fn identifiers_are_independent() {
    let limiter = SlidingWindowLimiter::new();
    for i in 0..5 {
        assert!(limiter.check_at("a", MINUTE, 5, T0 + i).success);
    }
    assert!(!limiter.check_at("a", MINUTE, 5, T0 + 10).success);
    assert!(limiter.check_at("b", MINUTE, 5, T0 + 10).success);
}

#[test]
fn zero_quota_rejects_everything() {
    let limiter = SlidingWindowLimiter::new();
    let decision = limiter.check_at("ip", MINUTE, 0, T0);
    assert!(!decision.success);
    assert_eq!(decision.remaining, 0);
    assert_eq!(decision.reset_at, T0 + 60_000);
}

// ============================================================
// Sliding window
// ============================================================

#[test]
fn window_slides_one_slot_at_a_time() {
    let limiter = SlidingWindowLimiter::new();
    // Three requests spread across the first 20 seconds.
    assert!(limiter.check_at("ip", MINUTE, 3, T0).success);
    assert!(limiter.check_at("ip", MINUTE, 3, T0 + 10_000).success);
    assert!(limiter.check_at("ip", MINUTE, 3, T0 + 20_000).success);
    assert!(!limiter.check_at("ip", MINUTE, 3, T0 + 30_000).success);

    // T0 has aged out, freeing exactly one slot.
    let after_first = limiter.check_at("ip", MINUTE, 3, T0 + 60_001);
    assert!(after_first.success);
    assert_eq!(after_first.remaining, 0);
    assert!(!limiter.check_at("ip", MINUTE, 3, T0 + 60_002).success);

    // T0 + 10_000 ages out next.
    assert!(limiter.check_at("ip", MINUTE, 3, T0 + 70_000).success);
}

#[test]
fn full_quota_returns_after_a_quiet_window() {
    let limiter = SlidingWindowLimiter::new();
    for i in 0..4 {
        limiter.check_at("ip", MINUTE, 4, T0 + i);
    }
    let later = T0 + 5 * 60_000;
    let decision = limiter.check_at("ip", MINUTE, 4, later);
    assert!(decision.success);
    assert_eq!(decision.remaining, 3);
}

// ============================================================
// resetAt
// ============================================================

#[test]
fn rejection_reset_is_when_the_oldest_request_expires() {
    let limiter = SlidingWindowLimiter::new();
    limiter.check_at("ip", MINUTE, 2, T0 + 1_500);
    limiter.check_at("ip", MINUTE, 2, T0 + 9_000);

    let rejected = limiter.check_at("ip", MINUTE, 2, T0 + 30_000);
    assert!(!rejected.success);
    assert_eq!(rejected.reset_at, T0 + 1_500 + 60_000);

    // And that is precisely when the next request gets in.
    assert!(!limiter.check_at("ip", MINUTE, 2, rejected.reset_at - 1).success);
    assert!(limiter.check_at("ip", MINUTE, 2, rejected.reset_at).success);
}

#[test]
fn enormous_window_saturates_instead_of_overflowing() {
    let limiter = SlidingWindowLimiter::new();
    let forever = Duration::from_secs(u64::MAX);

    let admitted = limiter.check_at("ip", forever, 2, T0);
    assert!(admitted.success);
    assert_eq!(admitted.reset_at, i64::MAX);

    limiter.check_at("ip", forever, 2, T0 + 1);
    let rejected = limiter.check_at("ip", forever, 2, T0 + 2);
    assert!(!rejected.success);
    assert_eq!(rejected.reset_at, i64::MAX);

    // Nothing has been idle past the horizon yet.
    assert_eq!(limiter.cleanup_at(T0 + 3), 0);
}

#[test]
fn admitted_reset_is_a_full_interval_out() {
    let limiter = SlidingWindowLimiter::new();
    let decision = limiter.check_at("ip", Duration::from_secs(10), 5, T0);
    assert_eq!(decision.reset_at, T0 + 10_000);
}

// ============================================================
// Cleanup
// ============================================================

#[test]
fn cleanup_forgets_identifiers_idle_past_the_horizon() {
    let limiter = SlidingWindowLimiter::new();
    limiter.check_at("stale", MINUTE, 10, T0);
    limiter.check_at("fresh", MINUTE, 10, T0 + 50 * 60_000);
    assert_eq!(limiter.tracked_identifiers(), 2);

    let horizon = CLEANUP_HORIZON.as_millis() as i64;
    let removed = limiter.cleanup_at(T0 + horizon + 1);
    assert_eq!(removed, 1);
    assert_eq!(limiter.tracked_identifiers(), 1);

    // The survivor still counts against its quota.
    for i in 0..9 {
        limiter.check_at("fresh", MINUTE, 10, T0 + 50 * 60_000 + 1 + i);
    }
    assert!(!limiter
        .check_at("fresh", MINUTE, 10, T0 + 50 * 60_000 + 100)
        .success);
}

#[test]
fn cleanup_on_empty_limiter_is_a_noop() {
    let limiter = SlidingWindowLimiter::new();
    assert_eq!(limiter.cleanup_at(T0), 0);
    assert_eq!(limiter.tracked_identifiers(), 0);
}

// ============================================================
// Per-endpoint quotas
// ============================================================

#[test]
fn endpoint_quotas_do_not_share_state() {
    let limits = EndpointLimits::new(
        RateLimitPolicy::per_minute(1),
        RateLimitPolicy::per_minute(1),
        RateLimitPolicy::per_minute(1),
    );

    assert!(limits.dislike.check_at("ip", T0).success);
    assert!(!limits.dislike.check_at("ip", T0 + 1).success);

    // Exhausting dislikes leaves reactions and reads untouched.
    assert!(limits.reaction.check_at("ip", T0 + 2).success);
    assert!(limits.read.check_at("ip", T0 + 3).success);
}

#[test]
fn endpoint_limiter_reports_its_policy() {
    let limiter = EndpointLimiter::new("dislike", RateLimitPolicy::new(MINUTE, 30));
    assert_eq!(limiter.name(), "dislike");
    assert_eq!(limiter.policy().max_requests, 30);
    assert_eq!(limiter.policy().interval, MINUTE);
}

#[test]
fn concurrent_checks_never_over_admit() {
    let limiter = Arc::new(SlidingWindowLimiter::new());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let limiter = Arc::clone(&limiter);
            std::thread::spawn(move || {
                (0..25)
                    .filter(|i| limiter.check_at("shared", MINUTE, 50, T0 + t * 25 + i).success)
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 50);
}
