//! Date-range event queries: cache lookup, provider fetch, filter, write-back.
//!
//! Identical concurrent queries are not coalesced; each miss recomputes and the
//! last writer wins, which is harmless because the recomputed value is the same.

use crate::cache::CacheStore;
use crate::config::CacheConfig;
use crate::error::{EventError, Result};
use crate::events::model::Event;
use crate::provider::EventFeed;
use crate::utils::date_range::DateRange;
use log::{debug, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const STALE_KEY_PREFIX: &str = "stale:";

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Expiry for written-back results; `None` keeps them forever
    pub ttl: Option<Duration>,
    /// Serve the last computed result for a range when the provider is down
    pub serve_stale: bool,
    /// Expiry for the stale copy
    pub stale_ttl: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for ServiceOptions {
    fn from(config: &CacheConfig) -> Self {
        Self {
            ttl: config.ttl,
            serve_stale: config.serve_stale,
            stale_ttl: config.stale_ttl,
        }
    }
}

/// Outcome of a cache read. Unavailability is kept apart from a miss so a
/// request does not pay the store timeout a second time on write-back.
#[derive(Debug)]
enum CacheLookup {
    Hit(Vec<Event>),
    Miss,
    Unavailable,
}

#[derive(Debug, Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    cache_errors: AtomicU64,
    upstream_fetches: AtomicU64,
    stale_served: AtomicU64,
}

/// Snapshot of the service counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_errors: u64,
    pub upstream_fetches: u64,
    pub stale_served: u64,
}

pub struct EventService {
    feed: Arc<dyn EventFeed>,
    cache: Arc<dyn CacheStore>,
    options: ServiceOptions,
    counters: Counters,
}

impl EventService {
    pub fn new(feed: Arc<dyn EventFeed>, cache: Arc<dyn CacheStore>, options: ServiceOptions) -> Self {
        Self {
            feed,
            cache,
            options,
            counters: Counters::default(),
        }
    }

    /// Returns the online events whose start date lies in `[start, end]`, in feed order.
    pub async fn get_by_range(&self, start: &str, end: &str) -> Result<Vec<Event>> {
        let range = DateRange::parse(start, end)?;
        let key = range.cache_key();

        let cache_reachable = match self.read_cached(&key).await {
            CacheLookup::Hit(events) => {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache HIT for key: {} ({} events)", key, events.len());
                return Ok(events);
            }
            CacheLookup::Miss => true,
            CacheLookup::Unavailable => false,
        };
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache MISS for key: {}", key);

        self.counters.upstream_fetches.fetch_add(1, Ordering::Relaxed);
        let all_events = match self.feed.fetch_all().await {
            Ok(events) => events,
            Err(e) if cache_reachable => return self.recover_from_upstream(&key, e).await,
            Err(e) => return Err(e),
        };

        let filtered: Vec<Event> = all_events
            .into_iter()
            .filter(|event| range.contains(&event.start_date))
            .collect();
        info!("Computed {} events for range {}", filtered.len(), range);

        if cache_reachable {
            self.write_back(&key, &filtered).await;
        } else {
            debug!("Skipping write-back for key {}: cache unavailable", key);
        }
        Ok(filtered)
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            cache_errors: self.counters.cache_errors.load(Ordering::Relaxed),
            upstream_fetches: self.counters.upstream_fetches.load(Ordering::Relaxed),
            stale_served: self.counters.stale_served.load(Ordering::Relaxed),
        }
    }

    /// Cache read that never fails the query: unavailability is logged and
    /// counted, corrupt entries are logged and treated as a miss.
    async fn read_cached(&self, key: &str) -> CacheLookup {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Event>>(&raw) {
                Ok(events) => CacheLookup::Hit(events),
                Err(e) => {
                    warn!("Discarding undecodable cache entry for key {}: {}", key, e);
                    CacheLookup::Miss
                }
            },
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                self.counters.cache_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache read failed for key {}, falling back to provider: {}", key, e);
                CacheLookup::Unavailable
            }
        }
    }

    async fn write_back(&self, key: &str, events: &[Event]) {
        let payload = match serde_json::to_string(events) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode events for key {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &payload, self.options.ttl).await {
            self.counters.cache_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Cache write failed for key {}: {}", key, e);
            return;
        }
        if self.options.serve_stale {
            let stale_key = format!("{}{}", STALE_KEY_PREFIX, key);
            let stale_ttl = Some(self.options.stale_ttl);
            if let Err(e) = self.cache.set(&stale_key, &payload, stale_ttl).await {
                self.counters.cache_errors.fetch_add(1, Ordering::Relaxed);
                warn!("Cache write failed for key {}: {}", stale_key, e);
            }
        }
    }

    /// Upstream unavailability or timeout may be answered from the stale copy;
    /// decode failures and everything else propagate.
    async fn recover_from_upstream(&self, key: &str, err: EventError) -> Result<Vec<Event>> {
        let degradable = matches!(
            err,
            EventError::UpstreamUnavailable(_) | EventError::UpstreamTimeout(_)
        );
        if !(degradable && self.options.serve_stale) {
            return Err(err);
        }

        let stale_key = format!("{}{}", STALE_KEY_PREFIX, key);
        match self.read_cached(&stale_key).await {
            CacheLookup::Hit(events) => {
                self.counters.stale_served.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Provider failed ({}); serving {} stale events for key {}",
                    err,
                    events.len(),
                    key
                );
                Ok(events)
            }
            CacheLookup::Miss | CacheLookup::Unavailable => Err(err),
        }
    }
}
