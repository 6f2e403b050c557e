//! Testing infrastructure shared by unit and integration tests.

pub mod mock_feed;

pub use mock_feed::{sample_event, FailingCache, MockFeed};
