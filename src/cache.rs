// src/cache.rs
//! Key-value caching layer for computed date-range query results.
//!
//! `CacheStore` is the seam the service depends on. `RedisCache` talks to the
//! shared remote store; `MemoryCache` keeps entries in-process for local runs.
//! A missing key is `Ok(None)`; connectivity failures are `CacheUnavailable`.

use crate::config::CacheConfig;
use crate::error::{EventError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

const CONNECT_BACKOFF_BASE: u64 = 2;
const CONNECT_BACKOFF_FACTOR_MS: u64 = 100;

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value`; without a `ttl` the entry never expires.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Removes `key`. Returns whether it existed; an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Redis-backed store. The connection is established lazily so the service
/// can start (and fall back to the provider) while Redis is down.
pub struct RedisCache {
    client: redis::Client,
    conn_manager: OnceCell<ConnectionManager>,
    timeout: Duration,
    redis_url: String,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("redis_url", &self.redis_url)
            .field("timeout", &self.timeout)
            .field("connected", &self.conn_manager.initialized())
            .finish()
    }
}

impl RedisCache {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let redis_url = config.redis_url();
        info!("Configuring Redis cache at {} (timeout {:?})", redis_url, config.timeout);
        let client = redis::Client::open(redis_url.as_str()).map_err(|e| {
            EventError::ConfigError(format!("Invalid Redis URL {}: {}", redis_url, e))
        })?;
        Ok(Self {
            client,
            conn_manager: OnceCell::new(),
            timeout: config.timeout,
            redis_url,
        })
    }

    async fn with_timeout<T, F>(&self, op: &str, key: &str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!("Redis {} error for key {}: {}", op, key, e);
                Err(EventError::CacheUnavailable(format!("Redis {} error: {}", op, e)))
            }
            Err(_) => {
                error!("Redis {} for key {} timed out after {:?}", op, key, self.timeout);
                Err(EventError::CacheUnavailable(format!(
                    "Redis {} timed out after {:?}",
                    op, self.timeout
                )))
            }
        }
    }

    /// Connects on first use. A failed connect is reported straight away
    /// rather than retried, so a down store costs one attempt per call.
    async fn connection(&self) -> Result<ConnectionManager> {
        let conn = self
            .conn_manager
            .get_or_try_init(|| async {
                let connect = ConnectionManager::new_with_backoff(
                    self.client.clone(),
                    CONNECT_BACKOFF_BASE,
                    CONNECT_BACKOFF_FACTOR_MS,
                    0,
                );
                let manager = self.with_timeout("CONNECT", &self.redis_url, connect).await?;
                info!("Redis ConnectionManager initialized for {}", self.redis_url);
                Ok::<_, EventError>(manager)
            })
            .await?;
        Ok(conn.clone())
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        debug!("Attempting to GET cache for key: {}", key);
        let mut conn = self.connection().await?;
        self.with_timeout("GET", key, conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection().await?;
        match ttl {
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                self.with_timeout("SETEX", key, conn.set_ex::<_, _, ()>(key, value, secs))
                    .await?;
                debug!("Cache SETEX success for key: {} with TTL: {}s", key, secs);
            }
            None => {
                self.with_timeout("SET", key, conn.set::<_, _, ()>(key, value))
                    .await?;
                debug!("Cache SET success for key: {} (no expiry)", key);
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        debug!("Attempting to DEL cache for key: {}", key);
        let mut conn = self.connection().await?;
        let removed = self.with_timeout("DEL", key, conn.del::<_, i32>(key)).await?;
        Ok(removed > 0)
    }
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

/// In-process store honoring TTLs. Entries are not shared across instances.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        if self.entries.remove_if(key, |_, e| e.is_expired(now)).is_some() {
            debug!("Cache entry for key {} expired", key);
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        // expired keys are never read again, so drop them here
        self.entries.retain(|_, e| !e.is_expired(now));
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}
