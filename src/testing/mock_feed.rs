//! Test doubles for the provider feed and the cache store.

use crate::cache::CacheStore;
use crate::error::{EventError, Result};
use crate::events::model::{Event, Zone, ONLINE_SELL_MODE};
use crate::provider::EventFeed;
use crate::utils::date_range::parse_timestamp;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Feed that returns a fixed list (or a fixed error) and counts calls.
#[derive(Debug)]
pub struct MockFeed {
    response: Mutex<std::result::Result<Vec<Event>, EventError>>,
    calls: AtomicUsize,
}

impl MockFeed {
    pub fn with_events(events: Vec<Event>) -> Self {
        Self {
            response: Mutex::new(Ok(events)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(err: EventError) -> Self {
        Self {
            response: Mutex::new(Err(err)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every later fetch fail with `err`.
    pub fn fail_with(&self, err: EventError) {
        if let Ok(mut response) = self.response.lock() {
            *response = Err(err);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventFeed for MockFeed {
    async fn fetch_all(&self) -> Result<Vec<Event>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.response.lock() {
            Ok(response) => response.clone(),
            Err(_) => Err(EventError::UpstreamUnavailable("mock feed poisoned".to_string())),
        }
    }
}

/// Cache whose store is always unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Err(EventError::CacheUnavailable("connection refused".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
        Err(EventError::CacheUnavailable("connection refused".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Err(EventError::CacheUnavailable("connection refused".to_string()))
    }
}

/// Online event starting at `start_date`, ending one hour later.
///
/// Panics on a malformed `start_date`; intended for tests only.
pub fn sample_event(id: &str, start_date: &str) -> Event {
    let start = parse_timestamp(start_date).expect("sample_event needs a valid start date");
    Event {
        id: id.to_string(),
        base_event_id: format!("base-{}", id),
        title: format!("Event {}", id),
        start_date: start,
        end_date: start + chrono::Duration::hours(1),
        sale_mode: ONLINE_SELL_MODE.to_string(),
        zones: vec![Zone {
            zone_id: "1".to_string(),
            name: "Platea".to_string(),
            capacity: 100,
            price: "20.00".to_string(),
            numbered: true,
        }],
    }
}
