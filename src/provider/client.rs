//! HTTP client for the upstream event provider.

use super::{feed::parse_feed, EventFeed};
use crate::config::ProviderConfig;
use crate::error::{EventError, Result};
use crate::events::model::Event;
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;

/// Fetches the provider's full event list with one GET, no retries.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    url: String,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("events-api/0.1")
            .build()
            .map_err(|e| EventError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventFeed for ProviderClient {
    async fn fetch_all(&self) -> Result<Vec<Event>> {
        debug!("Requesting provider feed from {}", self.url);

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            error!("Provider request to {} failed: {}", self.url, e);
            EventError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("Provider returned {} for {}", status, self.url);
            return Err(EventError::UpstreamUnavailable(format!(
                "provider returned status {}",
                status
            )));
        }

        let body = response.text().await.map_err(EventError::from)?;
        let events = parse_feed(&body).map_err(|e| {
            error!("Failed to decode provider feed: {}", e);
            e
        })?;

        debug!("Provider feed decoded: {} online events", events.len());
        Ok(events)
    }
}
