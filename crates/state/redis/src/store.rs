use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;

use dropfade_state::error::StateError;
use dropfade_state::key::{KeyKind, StateKey};
use dropfade_state::store::StateStore;

use crate::config::RedisConfig;
use crate::key_render::{render_key, strip_prefix};

/// Number of keys requested per `SCAN` round trip.
const SCAN_BATCH: usize = 100;

/// Redis-backed implementation of [`StateStore`].
///
/// Values are stored as plain Redis strings with native expiry. `DEL` is
/// atomic per key and reports how many keys it removed, which is what gives
/// `delete` its exactly-one-winner guarantee.
pub struct RedisStateStore {
    pool: Pool,
    prefix: String,
}

impl RedisStateStore {
    /// Create a new `RedisStateStore` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StateError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StateError::Connection(e.to_string()))?
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
        })
    }

    fn redis_key(&self, key: &StateKey) -> String {
        render_key(&self.prefix, key)
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

/// TTL in whole milliseconds, never zero (Redis rejects `PX 0`).
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn backend(e: &redis::RedisError) -> StateError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_timeout() {
        StateError::Connection(e.to_string())
    } else {
        StateError::Backend(e.to_string())
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn check_and_set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(&redis_key).arg(value).arg("NX");
        if let Some(d) = ttl {
            cmd.arg("PX").arg(ttl_millis(d));
        }

        // `SET ... NX` replies OK when written and nil when the key exists.
        let reply: Option<String> = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| backend(&e))?;

        Ok(reply.is_some())
    }

    async fn get(&self, key: &StateKey) -> Result<Option<String>, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        let val: Option<String> = conn.get(&redis_key).await.map_err(|e| backend(&e))?;
        Ok(val)
    }

    async fn set(
        &self,
        key: &StateKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        let mut cmd = redis::cmd("SET");
        cmd.arg(&redis_key).arg(value);
        if let Some(d) = ttl {
            cmd.arg("PX").arg(ttl_millis(d));
        }
        let () = cmd.query_async(&mut conn).await.map_err(|e| backend(&e))?;

        Ok(())
    }

    async fn delete(&self, key: &StateKey) -> Result<bool, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        let deleted: i64 = conn.del(&redis_key).await.map_err(|e| backend(&e))?;
        Ok(deleted > 0)
    }

    async fn remaining_ttl(&self, key: &StateKey) -> Result<Option<Duration>, StateError> {
        let redis_key = self.redis_key(key);
        let mut conn = self.conn().await?;

        // PTTL: -2 when the key is missing, -1 when it has no expiry.
        let ms: i64 = conn.pttl(&redis_key).await.map_err(|e| backend(&e))?;
        Ok(u64::try_from(ms).ok().map(Duration::from_millis))
    }

    async fn scan_keys_by_kind(
        &self,
        kind: KeyKind,
    ) -> Result<Vec<(String, String)>, StateError> {
        let pattern = format!("{}:{}:*", self.prefix, kind);

        let mut conn = self.conn().await?;
        let mut results = Vec::new();
        let mut cursor = 0u64;

        loop {
            let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| backend(&e))?;

            if !keys.is_empty() {
                // Keys may expire between SCAN and MGET; those come back nil.
                let values: Vec<Option<String>> = redis::cmd("MGET")
                    .arg(&keys)
                    .query_async(&mut conn)
                    .await
                    .map_err(|e| backend(&e))?;

                for (key, value) in keys.iter().zip(values) {
                    if let Some(value) = value {
                        results.push((strip_prefix(&self.prefix, key).to_owned(), value));
                    }
                }
            }

            cursor = new_cursor;
            if cursor == 0 {
                break;
            }
        }

        tracing::debug!(kind = %kind, count = results.len(), "scanned redis keys");
        Ok(results)
    }

    async fn ping(&self) -> Result<(), StateError> {
        let mut conn = self.conn().await?;
        let reply: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| backend(&e))?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(StateError::Backend(format!("unexpected PING reply: {reply}")))
        }
    }
}
