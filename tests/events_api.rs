//! End-to-end tests for the events API
//!
//! A stub provider and the API itself are served on ephemeral local ports and
//! driven over HTTP; the cache is the in-process store so Redis is not needed.

use axum::{extract::State, http::StatusCode, routing::get, Router};
use events_api::{
    api::create_router,
    cache::{CacheStore, MemoryCache},
    config::ProviderConfig,
    events::{EventList, EventService, ServiceOptions},
    provider::{EventFeed, ProviderClient},
    EventError,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<eventList version="1.0">
  <output>
    <base_event base_event_id="1" sell_mode="online" title="Early concert">
      <event event_start_date="2021-07-01T00:00:00" event_end_date="2021-07-01T02:00:00" event_id="101">
        <zone zone_id="1" capacity="50" price="10.00" name="Pista" numbered="false"/>
      </event>
    </base_event>
    <base_event base_event_id="2" sell_mode="online" title="Summer concert">
      <event event_start_date="2021-08-01T00:00:00" event_end_date="2021-08-01T02:00:00" event_id="102">
        <zone zone_id="2" capacity="243" price="20.00" name="Platea" numbered="true"/>
      </event>
    </base_event>
    <base_event base_event_id="3" sell_mode="offline" title="Box office only">
      <event event_start_date="2021-08-10T00:00:00" event_end_date="2021-08-10T02:00:00" event_id="103">
        <zone zone_id="3" capacity="10" price="5.00" name="Grada" numbered="false"/>
      </event>
    </base_event>
    <base_event base_event_id="4" sell_mode="online" title="Autumn concert">
      <event event_start_date="2021-09-01T00:00:00" event_end_date="2021-09-01T02:00:00" event_id="104"/>
    </base_event>
  </output>
</eventList>"#;

const DEFAULT_KEY: &str = "2021-07-30T21:00:01_2021-08-30T21:00:00";

/// Provider stand-in whose status, body and latency can be changed mid-test.
#[derive(Clone)]
struct StubProvider {
    status: Arc<AtomicU16>,
    delay_ms: Arc<AtomicU64>,
    body: Arc<std::sync::Mutex<String>>,
    hits: Arc<AtomicUsize>,
}

impl StubProvider {
    fn new() -> Self {
        Self {
            status: Arc::new(AtomicU16::new(200)),
            delay_ms: Arc::new(AtomicU64::new(0)),
            body: Arc::new(std::sync::Mutex::new(FEED_XML.to_string())),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn set_status(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    fn set_body(&self, body: &str) {
        *self.body.lock().unwrap() = body.to_string();
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn provider_events(State(stub): State<StubProvider>) -> (StatusCode, String) {
    stub.hits.fetch_add(1, Ordering::SeqCst);
    let delay = stub.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    let status = StatusCode::from_u16(stub.status.load(Ordering::SeqCst)).unwrap();
    let body = stub.body.lock().unwrap().clone();
    (status, body)
}

async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

struct TestApp {
    base_url: String,
    provider_url: String,
    provider: StubProvider,
    cache: Arc<MemoryCache>,
    http: reqwest::Client,
}

impl TestApp {
    async fn start() -> Self {
        Self::start_with_timeout(Duration::from_secs(3)).await
    }

    async fn start_with_timeout(provider_timeout: Duration) -> Self {
        let provider = StubProvider::new();
        let provider_addr = spawn(
            Router::new()
                .route("/api/events", get(provider_events))
                .with_state(provider.clone()),
        )
        .await;

        let provider_url = format!("http://{}/api/events", provider_addr);
        let feed = ProviderClient::new(&ProviderConfig {
            url: provider_url.clone(),
            timeout: provider_timeout,
        })
        .unwrap();
        let cache = Arc::new(MemoryCache::new());
        let service = Arc::new(EventService::new(
            Arc::new(feed),
            cache.clone(),
            ServiceOptions::default(),
        ));
        let api_addr = spawn(create_router(service)).await;

        Self {
            base_url: format!("http://{}", api_addr),
            provider_url,
            provider,
            cache,
            http: reqwest::Client::new(),
        }
    }

    async fn get(&self, path_and_query: &str) -> reqwest::Response {
        self.http
            .get(format!("{}{}", self.base_url, path_and_query))
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_default_range_returns_online_events_in_range() {
    let app = TestApp::start().await;

    let response = app.get("/events").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let body: EventList = response.json().await.unwrap();
    let ids: Vec<&str> = body.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["102"]);
    assert_eq!(body.events[0].title, "Summer concert");
    assert_eq!(body.events[0].zones[0].name, "Platea");
}

#[tokio::test]
async fn test_response_envelope_shape() {
    let app = TestApp::start().await;

    let body: Value = app
        .get("/events?starts_at=2021-06-30T21:00:01&ends_at=2021-12-31T00:00:00")
        .await
        .json()
        .await
        .unwrap();

    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[1]["start_date"], "2021-08-01T00:00:00");
    assert_eq!(events[1]["base_event_id"], "2");
    assert_eq!(events[1]["sale_mode"], "online");
    assert_eq!(events[2]["id"], "104");
    assert_eq!(events[2]["zones"], serde_json::json!([]));
}

#[tokio::test]
async fn test_repeat_query_is_served_from_cache() {
    let app = TestApp::start().await;

    let first: EventList = app.get("/events").await.json().await.unwrap();
    let second: EventList = app.get("/events").await.json().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(app.provider.hits(), 1);
    assert!(app.cache.get(DEFAULT_KEY).await.unwrap().is_some());
}

#[tokio::test]
async fn test_padded_query_values_share_the_cache_entry() {
    let app = TestApp::start().await;

    let plain = app.get("/events").await;
    assert_eq!(plain.status(), reqwest::StatusCode::OK);
    let padded = app
        .get("/events?starts_at=%202021-07-30T21:00:01&ends_at=2021-08-30T21:00:00%20")
        .await;
    assert_eq!(padded.status(), reqwest::StatusCode::OK);

    assert_eq!(app.provider.hits(), 1);
}

#[tokio::test]
async fn test_malformed_date_is_client_error() {
    let app = TestApp::start().await;

    let response = app.get("/events?starts_at=not-a-date").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "parse_error");
    assert_eq!(app.provider.hits(), 0);
}

#[tokio::test]
async fn test_inverted_range_is_client_error() {
    let app = TestApp::start().await;

    let response = app
        .get("/events?starts_at=2021-08-30T21:00:00&ends_at=2021-07-30T21:00:01")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_outage_is_not_reported_as_empty() {
    let app = TestApp::start().await;
    app.provider.set_status(503);

    let response = app.get("/events").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "upstream_unavailable");
    assert!(body.get("events").is_none());
}

#[tokio::test]
async fn test_provider_outage_falls_back_to_stale_result() {
    let app = TestApp::start().await;
    let fresh: EventList = app.get("/events").await.json().await.unwrap();

    // primary entry gone (as if expired), provider down
    app.cache.delete(DEFAULT_KEY).await.unwrap();
    app.provider.set_status(500);

    let response = app.get("/events").await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let stale: EventList = response.json().await.unwrap();
    assert_eq!(stale, fresh);
    assert_eq!(app.provider.hits(), 2);
}

#[tokio::test]
async fn test_malformed_feed_is_bad_gateway() {
    let app = TestApp::start().await;
    app.provider.set_body("<eventList><output><base_event");

    let response = app.get("/events").await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["kind"], "decode_error");
}

#[tokio::test]
async fn test_slow_provider_is_gateway_timeout() {
    let app = TestApp::start_with_timeout(Duration::from_millis(200)).await;
    app.provider.delay_ms.store(2_000, Ordering::SeqCst);

    let response = app.get("/events").await;
    assert_eq!(response.status(), reqwest::StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn test_health_reports_cache_counters() {
    let app = TestApp::start().await;
    app.get("/events").await;
    app.get("/events").await;

    let body: Value = app.get("/health").await.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["stats"]["cache_hits"], 1);
    assert_eq!(body["stats"]["cache_misses"], 1);
    assert_eq!(body["stats"]["upstream_fetches"], 1);
}

#[tokio::test]
async fn test_provider_client_keeps_only_online_events() {
    let app = TestApp::start().await;
    let client = ProviderClient::new(&ProviderConfig {
        url: app.provider_url.clone(),
        timeout: Duration::from_secs(3),
    })
    .unwrap();

    let events = client.fetch_all().await.unwrap();
    let base_ids: Vec<&str> = events.iter().map(|e| e.base_event_id.as_str()).collect();
    assert_eq!(base_ids, vec!["1", "2", "4"]);
    assert!(events.iter().all(|e| e.sale_mode == "online"));
}

#[tokio::test]
async fn test_provider_client_surfaces_non_success_status() {
    let app = TestApp::start().await;
    let client = ProviderClient::new(&ProviderConfig {
        url: format!("{}/missing", app.base_url),
        timeout: Duration::from_secs(3),
    })
    .unwrap();

    assert!(matches!(
        client.fetch_all().await,
        Err(EventError::UpstreamUnavailable(_))
    ));
}
