pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod provider;
pub mod testing; // Test doubles shared with integration tests
pub mod utils;

pub use cache::{CacheStore, MemoryCache, RedisCache};
pub use error::EventError;
pub use events::{Event, EventList, EventService, ServiceOptions};
pub use provider::{EventFeed, ProviderClient};
