// Per-endpoint quotas.
//
// Every guarded endpoint owns an EndpointLimiter: its policy plus its own
// window store. Two endpoints never share counters, so a client that burns
// its dislike quota can still read game tallies.

use std::time::Duration;

use super::window::{RateLimitDecision, SlidingWindowLimiter};

/// Requests allowed per trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub interval: Duration,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub const fn new(interval: Duration, max_requests: u32) -> Self {
        Self {
            interval,
            max_requests,
        }
    }

    pub const fn per_minute(max_requests: u32) -> Self {
        Self::new(Duration::from_secs(60), max_requests)
    }
}

/// A policy bound to its own sliding-window store.
#[derive(Debug)]
pub struct EndpointLimiter {
    name: &'static str,
    policy: RateLimitPolicy,
    window: SlidingWindowLimiter,
}

impl EndpointLimiter {
    pub fn new(name: &'static str, policy: RateLimitPolicy) -> Self {
        Self {
            name,
            policy,
            window: SlidingWindowLimiter::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn check(&self, identifier: &str) -> RateLimitDecision {
        self.window
            .check(identifier, self.policy.interval, self.policy.max_requests)
    }

    pub fn check_at(&self, identifier: &str, now_ms: i64) -> RateLimitDecision {
        self.window.check_at(
            identifier,
            self.policy.interval,
            self.policy.max_requests,
            now_ms,
        )
    }

    pub fn cleanup(&self) -> usize {
        self.window.cleanup()
    }

    pub fn tracked_identifiers(&self) -> usize {
        self.window.tracked_identifiers()
    }
}

/// The limiter set the HTTP API is built with.
#[derive(Debug)]
pub struct EndpointLimits {
    pub dislike: EndpointLimiter,
    pub reaction: EndpointLimiter,
    pub read: EndpointLimiter,
}

impl EndpointLimits {
    pub fn new(dislike: RateLimitPolicy, reaction: RateLimitPolicy, read: RateLimitPolicy) -> Self {
        Self {
            dislike: EndpointLimiter::new("dislike", dislike),
            reaction: EndpointLimiter::new("reaction", reaction),
            read: EndpointLimiter::new("read", read),
        }
    }

    pub fn all(&self) -> [&EndpointLimiter; 3] {
        [&self.dislike, &self.reaction, &self.read]
    }
}
