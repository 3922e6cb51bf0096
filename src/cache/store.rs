//! Cache backends.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::CacheError;
use crate::lifecycle::sweeper::Sweep;

/// Key-value store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value for `key`, unless absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Insert or overwrite `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
}

/// A cached value and its deadline.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-process cache for single-instance deployments.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, e| e.is_expired(now));
        }
        None
    }

    /// Drop every entry whose TTL has elapsed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        before.saturating_sub(self.entries.len())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.get_at(key, Instant::now()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}

impl Sweep for MemoryCacheStore {
    fn name(&self) -> &'static str {
        "result_cache"
    }

    fn sweep(&self) -> usize {
        self.purge_expired()
    }
}
