//! Shared counter store on Redis.
//!
//! Each key is a sorted set of hit members scored by the Redis server's
//! clock in milliseconds. Every operation is one Lua script, so pruning,
//! counting and inserting happen atomically across all instances.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Script;

use super::limiter::{Acquire, CounterStore, LimiterError};
use crate::observability::logging::redis_endpoint;

const PRELUDE: &str = r#"
local key = KEYS[1]
local window = tonumber(ARGV[1])
local t = redis.call('TIME')
local now = tonumber(t[1]) * 1000 + math.floor(tonumber(t[2]) / 1000)
redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
"#;

const COUNT_BODY: &str = r#"
return redis.call('ZCARD', key)
"#;

const HIT_BODY: &str = r#"
redis.call('ZADD', key, now, now .. '-' .. ARGV[2])
redis.call('PEXPIRE', key, window)
return redis.call('ZCARD', key)
"#;

const ACQUIRE_BODY: &str = r#"
local limit = tonumber(ARGV[3])
local count = redis.call('ZCARD', key)
if count < limit then
  redis.call('ZADD', key, now, now .. '-' .. ARGV[2])
  redis.call('PEXPIRE', key, window)
  return {1, count + 1}
end
return {0, count}
"#;

/// Sliding-log counter store shared by every instance using the same Redis.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: MultiplexedConnection,
    prefix: String,
    count_script: Script,
    hit_script: Script,
    acquire_script: Script,
}

impl RedisCounterStore {
    /// Connect to `url`; keys are stored under `prefix`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> Result<Self, LimiterError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!(endpoint = %redis_endpoint(&client), "Rate limiter connected to Redis");
        Ok(Self::from_connection(conn, prefix))
    }

    pub fn from_connection(conn: MultiplexedConnection, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
            count_script: Script::new(&format!("{PRELUDE}{COUNT_BODY}")),
            hit_script: Script::new(&format!("{PRELUDE}{HIT_BODY}")),
            acquire_script: Script::new(&format!("{PRELUDE}{ACQUIRE_BODY}")),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    async fn count(&self, key: &str, window: Duration) -> Result<u64, LimiterError> {
        let mut conn = self.conn.clone();
        let count: u64 = self
            .count_script
            .key(self.key(key))
            .arg(window_ms(window))
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }
}

fn window_ms(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn member_suffix() -> String {
    format!("{:016x}", fastrand::u64(..))
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn test(&self, key: &str, limit: u64, window: Duration) -> Result<bool, LimiterError> {
        Ok(self.count(key, window).await? < limit)
    }

    async fn hit(&self, key: &str, window: Duration) -> Result<u64, LimiterError> {
        let mut conn = self.conn.clone();
        let count: u64 = self
            .hit_script
            .key(self.key(key))
            .arg(window_ms(window))
            .arg(member_suffix())
            .invoke_async(&mut conn)
            .await?;
        Ok(count)
    }

    async fn current_count(&self, key: &str, window: Duration) -> Result<u64, LimiterError> {
        self.count(key, window).await
    }

    async fn try_acquire(&self, key: &str, limit: u64, window: Duration) -> Result<Acquire, LimiterError> {
        let mut conn = self.conn.clone();
        let reply: Vec<i64> = self
            .acquire_script
            .key(self.key(key))
            .arg(window_ms(window))
            .arg(member_suffix())
            .arg(limit)
            .invoke_async(&mut conn)
            .await?;

        match reply.as_slice() {
            [1, count] => Ok(Acquire::Allowed { count: (*count).max(0) as u64 }),
            [0, count] => Ok(Acquire::Denied { count: (*count).max(0) as u64 }),
            other => Err(LimiterError::Protocol(format!("{other:?}"))),
        }
    }
}
