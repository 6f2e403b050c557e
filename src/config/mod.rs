pub mod settings;

pub use settings::{CacheBackend, CacheConfig, Config, ProviderConfig, ServerConfig};

use crate::error::EventError;
use std::sync::Arc;

/// Loads and validates the application configuration as an `Arc<Config>`.
/// Logging is not up yet at this point; callers log the settings afterwards.
pub fn load_config() -> Result<Arc<Config>, EventError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env();
    config.validate()?;

    Ok(Arc::new(config))
}
