// Server-side rate limiting: sliding-window logs keyed by client identifier.
//
// window.rs holds the algorithm, policy.rs binds quotas to endpoints, and
// sweeper.rs keeps memory bounded in long-running processes.

pub mod policy;
pub mod sweeper;
pub mod window;

pub use policy::{EndpointLimiter, EndpointLimits, RateLimitPolicy};
pub use sweeper::spawn_sweeper;
pub use window::{now_millis, RateLimitDecision, SlidingWindowLimiter, CLEANUP_HORIZON};
