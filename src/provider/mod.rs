//! Upstream event provider: XML wire format and HTTP client.

pub mod client;
pub mod feed;

pub use client::ProviderClient;
pub use feed::parse_feed;

use crate::error::Result;
use crate::events::model::Event;
use async_trait::async_trait;

/// Source of the complete, online-only event list.
#[async_trait]
pub trait EventFeed: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<Event>>;
}
