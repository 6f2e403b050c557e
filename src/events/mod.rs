pub mod model;
pub mod service;

pub use model::{Event, EventList, Zone, ONLINE_SELL_MODE};
pub use service::{EventService, ServiceOptions, ServiceStats};
