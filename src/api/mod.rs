pub mod server;

pub use server::{create_router, ApiError, ApiServer, AppState, EventsQuery};
