use crate::utils::date_range::timestamp_format;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The only sell mode this service serves.
pub const ONLINE_SELL_MODE: &str = "online";

/// A pricing zone of an event, carried through from the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub zone_id: String,
    pub name: String,
    pub capacity: u32,
    pub price: String,
    pub numbered: bool,
}

/// Normalized event record shared by ingestion, filtering, caching and the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Provider event id
    pub id: String,
    pub base_event_id: String,
    pub title: String,
    #[serde(with = "timestamp_format")]
    pub start_date: NaiveDateTime,
    #[serde(with = "timestamp_format")]
    pub end_date: NaiveDateTime,
    pub sale_mode: String,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Event {
    pub fn is_online(&self) -> bool {
        self.sale_mode == ONLINE_SELL_MODE
    }
}

/// Response envelope for `GET /events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<Event>,
}
