//! Wire types for the provider's XML document
//! (`eventList > output > base_event > event > zone`) and their mapping to `Event`.

use crate::error::{EventError, Result};
use crate::events::model::{Event, Zone, ONLINE_SELL_MODE};
use crate::utils::date_range::parse_timestamp;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FeedDocument {
    output: FeedOutput,
}

#[derive(Debug, Default, Deserialize)]
struct FeedOutput {
    #[serde(rename = "base_event", default)]
    base_events: Vec<FeedBaseEvent>,
}

#[derive(Debug, Deserialize)]
struct FeedBaseEvent {
    #[serde(rename = "@base_event_id")]
    base_event_id: String,
    #[serde(rename = "@title")]
    title: String,
    #[serde(rename = "@sell_mode")]
    sell_mode: String,
    event: FeedEvent,
}

#[derive(Debug, Deserialize)]
struct FeedEvent {
    #[serde(rename = "@event_id")]
    event_id: String,
    #[serde(rename = "@event_start_date")]
    event_start_date: String,
    #[serde(rename = "@event_end_date")]
    event_end_date: String,
    #[serde(rename = "zone", default)]
    zones: Vec<FeedZone>,
}

#[derive(Debug, Deserialize)]
struct FeedZone {
    #[serde(rename = "@zone_id")]
    zone_id: String,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@capacity")]
    capacity: u32,
    #[serde(rename = "@price")]
    price: String,
    #[serde(rename = "@numbered")]
    numbered: bool,
}

impl From<FeedZone> for Zone {
    fn from(zone: FeedZone) -> Self {
        Zone {
            zone_id: zone.zone_id,
            name: zone.name,
            capacity: zone.capacity,
            price: zone.price,
            numbered: zone.numbered,
        }
    }
}

impl TryFrom<FeedBaseEvent> for Event {
    type Error = EventError;

    fn try_from(base: FeedBaseEvent) -> Result<Self> {
        let decode_date = |raw: &str| {
            parse_timestamp(raw).map_err(|e| {
                EventError::DecodeError(format!("base event {}: {}", base.base_event_id, e))
            })
        };
        let start_date = decode_date(&base.event.event_start_date)?;
        let end_date = decode_date(&base.event.event_end_date)?;

        Ok(Event {
            id: base.event.event_id,
            base_event_id: base.base_event_id,
            title: base.title,
            start_date,
            end_date,
            sale_mode: base.sell_mode,
            zones: base.event.zones.into_iter().map(Zone::from).collect(),
        })
    }
}

/// Decodes a provider document, keeping only base events sold online, in feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<Event>> {
    let document: FeedDocument = quick_xml::de::from_str(xml)?;
    document
        .output
        .base_events
        .into_iter()
        .filter(|base| base.sell_mode == ONLINE_SELL_MODE)
        .map(Event::try_from)
        .collect()
}
