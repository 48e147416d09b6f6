// Throttled mutation batcher: coalesces bursts of increments per key.
//
// Every mutate() runs the optimistic callback right away, so the UI moves
// on each click. Only the network side is delayed: increments for a key
// accumulate until that key has been quiet for `quiet_period`, then one
// POST carries the whole sum.
//
// Each key has at most one live timer. A timer is a spawned tokio task
// sleeping until its deadline; replacing it aborts the old task. Because an
// abort can race with a task that has already woken, every timer also
// carries a generation number and only the current generation may flush.
//
// The flush takes the accumulated value and removes the timer entry in one
// critical section *before* the request goes out. A mutate() that lands
// while the POST is in flight starts a brand-new cycle instead of being
// zeroed by the old one.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::transport::{FlushError, HttpTransport, MutationTransport};

/// Quiet period used when the builder isn't given one.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

type PayloadFn = dyn Fn(&str, u64) -> Value + Send + Sync;
type OptimisticFn = dyn Fn(u64) + Send + Sync;
type ErrorFn = dyn Fn(&FlushError, u64) + Send + Sync;
type SuccessFn = dyn Fn() + Send + Sync;

/// Configures a [`ThrottledMutation`].
pub struct ThrottledMutationBuilder {
    endpoint: String,
    build_payload: Box<PayloadFn>,
    on_optimistic: Option<Box<OptimisticFn>>,
    on_error: Option<Box<ErrorFn>>,
    on_success: Option<Box<SuccessFn>>,
    quiet_period: Duration,
    transport: Option<Arc<dyn MutationTransport>>,
}

impl ThrottledMutationBuilder {
    /// Called synchronously with the increment on every `mutate`.
    pub fn on_optimistic(mut self, f: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_optimistic = Some(Box::new(f));
        self
    }

    /// Called with the error and the discarded accumulated value when a
    /// flush fails. This is where a caller reverts its optimistic update.
    pub fn on_error(mut self, f: impl Fn(&FlushError, u64) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_success(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn quiet_period(mut self, quiet_period: Duration) -> Self {
        self.quiet_period = quiet_period;
        self
    }

    /// Replace the default HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn MutationTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ThrottledMutation> {
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new()?),
        };

        Ok(ThrottledMutation {
            inner: Arc::new(Inner {
                endpoint: self.endpoint,
                build_payload: self.build_payload,
                on_optimistic: self.on_optimistic,
                on_error: self.on_error,
                on_success: self.on_success,
                quiet_period: self.quiet_period,
                transport,
                pending: Mutex::new(Pending::default()),
            }),
        })
    }
}

/// Per-key increment coalescing with optimistic updates.
///
/// Cloning yields another handle to the same batcher. Dropping the last
/// handle cancels every outstanding timer, same as
/// [`clear_pending`](Self::clear_pending). Flushes already on the wire finish.
///
/// `mutate` spawns tokio tasks and must be called from within a runtime.
#[derive(Clone)]
pub struct ThrottledMutation {
    inner: Arc<Inner>,
}

struct Inner {
    endpoint: String,
    build_payload: Box<PayloadFn>,
    on_optimistic: Option<Box<OptimisticFn>>,
    on_error: Option<Box<ErrorFn>>,
    on_success: Option<Box<SuccessFn>>,
    quiet_period: Duration,
    transport: Arc<dyn MutationTransport>,
    pending: Mutex<Pending>,
}

#[derive(Default)]
struct Pending {
    increments: HashMap<String, u64>,
    timers: HashMap<String, Timer>,
    next_generation: u64,
}

struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

impl ThrottledMutation {
    /// Start configuring a batcher that flushes to `endpoint`.
    ///
    /// `build_payload(key, accumulated)` must be pure: it is called once per
    /// flush to produce the JSON body.
    pub fn builder(
        endpoint: impl Into<String>,
        build_payload: impl Fn(&str, u64) -> Value + Send + Sync + 'static,
    ) -> ThrottledMutationBuilder {
        ThrottledMutationBuilder {
            endpoint: endpoint.into(),
            build_payload: Box::new(build_payload),
            on_optimistic: None,
            on_error: None,
            on_success: None,
            quiet_period: DEFAULT_QUIET_PERIOD,
            transport: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    pub fn quiet_period(&self) -> Duration {
        self.inner.quiet_period
    }

    /// `mutate_by(key, 1)`.
    pub fn mutate(&self, key: &str) {
        self.mutate_by(key, 1);
    }

    /// Record `increment` for `key` and (re)start its quiet-period timer.
    ///
    /// The increment isn't validated. Zero is accepted and accumulates
    /// nothing; range checks belong to the server.
    pub fn mutate_by(&self, key: &str, increment: u64) {
        if let Some(optimistic) = &self.inner.on_optimistic {
            optimistic(increment);
        }

        let deadline = Instant::now() + self.inner.quiet_period;
        let mut pending = self.inner.lock();

        let total = pending.increments.entry(key.to_string()).or_insert(0);
        *total = total.saturating_add(increment);

        if let Some(previous) = pending.timers.remove(key) {
            previous.handle.abort();
        }

        pending.next_generation += 1;
        let generation = pending.next_generation;

        let weak = Arc::downgrade(&self.inner);
        let task_key = key.to_string();
        let handle = tokio::spawn(async move {
            sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.flush(&task_key, generation).await;
            }
        });

        pending
            .timers
            .insert(key.to_string(), Timer { generation, handle });
    }

    /// Cancel every outstanding timer and forget all pending increments.
    /// Nothing still pending is sent. Safe to call repeatedly.
    pub fn clear_pending(&self) {
        let mut pending = self.inner.lock();
        let cancelled = pending.timers.len();
        for (_, timer) in pending.timers.drain() {
            timer.handle.abort();
        }
        pending.increments.clear();

        if cancelled > 0 {
            debug!(
                endpoint = %self.inner.endpoint,
                cancelled, "Cleared pending mutations"
            );
        }
    }

    /// The accumulated value waiting for `key`, if the key has been seen
    /// since the last clear. Flushed keys read back as `Some(0)`.
    pub fn pending_increment(&self, key: &str) -> Option<u64> {
        self.inner.lock().increments.get(key).copied()
    }

    /// Number of keys with a live timer.
    pub fn scheduled_keys(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn flush(&self, key: &str, generation: u64) {
        let accumulated = {
            let mut pending = self.lock();
            match pending.timers.get(key) {
                Some(timer) if timer.generation == generation => {}
                // Replaced or cleared while this timer was waking up.
                _ => return,
            }
            pending.timers.remove(key);
            pending
                .increments
                .get_mut(key)
                .map(std::mem::take)
                .unwrap_or(0)
        };

        if accumulated == 0 {
            return;
        }

        let payload = (self.build_payload)(key, accumulated);
        debug!(endpoint = %self.endpoint, key, accumulated, "Flushing batched mutation");

        match self.transport.post(&self.endpoint, &payload).await {
            Ok(reply) if reply.success => {
                if let Some(success) = &self.on_success {
                    success();
                }
            }
            Ok(reply) => {
                let message = reply.error.unwrap_or_else(|| "request failed".to_string());
                self.fail(
                    key,
                    FlushError::Rejected {
                        status: reply.status,
                        message,
                    },
                    accumulated,
                );
            }
            Err(e) => self.fail(key, FlushError::Transport(e), accumulated),
        }
    }

    fn fail(&self, key: &str, error: FlushError, accumulated: u64) {
        warn!(
            endpoint = %self.endpoint,
            key,
            accumulated,
            error = %error,
            "Batched mutation failed, discarding"
        );
        if let Some(on_error) = &self.on_error {
            on_error(&error, accumulated);
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(|e| e.into_inner());
        for (_, timer) in pending.timers.drain() {
            timer.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::transport::MutationReply;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingTransport {
        calls: AtomicU64,
    }

    #[async_trait]
    impl MutationTransport for CountingTransport {
        async fn post(&self, _endpoint: &str, _payload: &Value) -> Result<MutationReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MutationReply::ok())
        }
    }

    fn counting() -> Arc<CountingTransport> {
        Arc::new(CountingTransport {
            calls: AtomicU64::new(0),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_increment_flushes_nothing() {
        let transport = counting();
        let batcher = ThrottledMutation::builder("http://test/api", |_, n| serde_json::json!(n))
            .transport(transport.clone())
            .build()
            .unwrap();

        batcher.mutate_by("g1", 0);
        assert_eq!(batcher.scheduled_keys(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(batcher.scheduled_keys(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flushed_key_is_zeroed_not_removed() {
        let transport = counting();
        let batcher = ThrottledMutation::builder("http://test/api", |_, n| serde_json::json!(n))
            .transport(transport.clone())
            .build()
            .unwrap();

        batcher.mutate_by("g1", 4);
        assert_eq!(batcher.pending_increment("g1"), Some(4));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert_eq!(batcher.pending_increment("g1"), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_handle_cancels_timers() {
        let transport = counting();
        let batcher = ThrottledMutation::builder("http://test/api", |_, n| serde_json::json!(n))
            .transport(transport.clone())
            .build()
            .unwrap();

        batcher.mutate("g1");
        drop(batcher);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_state() {
        let transport = counting();
        let batcher = ThrottledMutation::builder("http://test/api", |_, n| serde_json::json!(n))
            .transport(transport.clone())
            .build()
            .unwrap();
        let other = batcher.clone();

        batcher.mutate("g1");
        other.mutate("g1");
        assert_eq!(batcher.pending_increment("g1"), Some(2));

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }
}
