//! Moving-window request limiter.
//!
//! # Responsibilities
//! - Count accepted hits per key over the trailing window
//! - Offer an atomic test-and-increment for the request path
//! - Forget hits once they fall out of the window
//!
//! # Design Decisions
//! - True sliding log: a hit counts while `now - hit < window`
//! - Counter stores are pluggable (in-process or Redis)
//! - The in-process store locks one DashMap shard per operation

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::lifecycle::sweeper::Sweep;

/// Errors raised by counter stores.
#[derive(Debug, Error)]
pub enum LimiterError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("unexpected counter store reply: {0}")]
    Protocol(String),
}

/// Result of an atomic test-and-increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// The hit was recorded; `count` includes it.
    Allowed { count: u64 },
    /// The key is at its limit; nothing was recorded.
    Denied { count: u64 },
}

impl Acquire {
    pub fn is_allowed(self) -> bool {
        matches!(self, Acquire::Allowed { .. })
    }

    pub fn count(self) -> u64 {
        match self {
            Acquire::Allowed { count } | Acquire::Denied { count } => count,
        }
    }
}

/// Backing storage for per-key hit logs.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Whether one more hit would stay within `limit`. Does not record.
    async fn test(&self, key: &str, limit: u64, window: Duration) -> Result<bool, LimiterError>;

    /// Record one hit unconditionally, returning the count including it.
    async fn hit(&self, key: &str, window: Duration) -> Result<u64, LimiterError>;

    /// Hits inside the trailing window.
    async fn current_count(&self, key: &str, window: Duration) -> Result<u64, LimiterError>;

    /// Record one hit only if that keeps the key within `limit`.
    async fn try_acquire(&self, key: &str, limit: u64, window: Duration) -> Result<Acquire, LimiterError>;
}

/// Per-key limiter over a pluggable counter store.
#[derive(Clone)]
pub struct MovingWindowLimiter {
    store: Arc<dyn CounterStore>,
}

impl MovingWindowLimiter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    pub async fn test(&self, key: &str, limit: u64, window_secs: u64) -> Result<bool, LimiterError> {
        self.store.test(key, limit, window(window_secs)).await
    }

    pub async fn hit(&self, key: &str, window_secs: u64) -> Result<u64, LimiterError> {
        self.store.hit(key, window(window_secs)).await
    }

    pub async fn current_count(&self, key: &str, window_secs: u64) -> Result<u64, LimiterError> {
        self.store.current_count(key, window(window_secs)).await
    }

    pub async fn try_acquire(&self, key: &str, limit: u64, window_secs: u64) -> Result<Acquire, LimiterError> {
        self.store.try_acquire(key, limit, window(window_secs)).await
    }
}

fn window(secs: u64) -> Duration {
    Duration::from_secs(secs.max(1))
}

/// Timestamps of recorded hits for one key, oldest first.
#[derive(Debug)]
struct HitLog {
    hits: VecDeque<Instant>,
    window: Duration,
}

impl HitLog {
    fn new(window: Duration) -> Self {
        Self {
            hits: VecDeque::new(),
            window,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.hits.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }

    fn count(&self) -> u64 {
        self.hits.len() as u64
    }
}

/// In-process counter store for single-instance deployments.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    logs: DashMap<String, HitLog>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    fn test_at(&self, key: &str, limit: u64, window: Duration, now: Instant) -> bool {
        match self.logs.get_mut(key) {
            Some(mut log) => {
                log.window = window;
                log.prune(now);
                log.count() < limit
            }
            None => limit > 0,
        }
    }

    fn hit_at(&self, key: &str, window: Duration, now: Instant) -> u64 {
        let mut log = self
            .logs
            .entry(key.to_string())
            .or_insert_with(|| HitLog::new(window));
        log.window = window;
        log.prune(now);
        log.hits.push_back(now);
        log.count()
    }

    fn current_count_at(&self, key: &str, window: Duration, now: Instant) -> u64 {
        match self.logs.get_mut(key) {
            Some(mut log) => {
                log.window = window;
                log.prune(now);
                log.count()
            }
            None => 0,
        }
    }

    fn try_acquire_at(&self, key: &str, limit: u64, window: Duration, now: Instant) -> Acquire {
        // The entry guard holds the shard lock across check and insert.
        let mut log = self
            .logs
            .entry(key.to_string())
            .or_insert_with(|| HitLog::new(window));
        log.window = window;
        log.prune(now);

        let count = log.count();
        if count < limit {
            log.hits.push_back(now);
            Acquire::Allowed { count: count + 1 }
        } else {
            Acquire::Denied { count }
        }
    }

    /// Drop keys whose every hit has left the window.
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let before = self.logs.len();
        self.logs.retain(|_, log| {
            log.prune(now);
            !log.hits.is_empty()
        });
        before.saturating_sub(self.logs.len())
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn test(&self, key: &str, limit: u64, window: Duration) -> Result<bool, LimiterError> {
        Ok(self.test_at(key, limit, window, Instant::now()))
    }

    async fn hit(&self, key: &str, window: Duration) -> Result<u64, LimiterError> {
        Ok(self.hit_at(key, window, Instant::now()))
    }

    async fn current_count(&self, key: &str, window: Duration) -> Result<u64, LimiterError> {
        Ok(self.current_count_at(key, window, Instant::now()))
    }

    async fn try_acquire(&self, key: &str, limit: u64, window: Duration) -> Result<Acquire, LimiterError> {
        Ok(self.try_acquire_at(key, limit, window, Instant::now()))
    }
}

impl Sweep for MemoryCounterStore {
    fn name(&self) -> &'static str {
        "rate_limit_counters"
    }

    fn sweep(&self) -> usize {
        self.purge_idle()
    }
}
