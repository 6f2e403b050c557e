use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EventError {
    /// A date-range bound or event timestamp is not `YYYY-MM-DDTHH:MM:SS`
    #[error("Parse Error: {0}")]
    ParseError(String),

    /// Range start is later than range end
    #[error("Invalid Range: {0}")]
    InvalidRange(String),

    /// Upstream XML could not be decoded into feed records
    #[error("Decode Error: {0}")]
    DecodeError(String),

    /// Provider answered with a non-success status or could not be reached
    #[error("Upstream Unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Provider did not answer within the configured timeout
    #[error("Upstream Timeout: {0}")]
    UpstreamTimeout(String),

    /// Cache store connectivity failure (distinct from a miss)
    #[error("Cache Unavailable: {0}")]
    CacheUnavailable(String),

    /// Events could not be encoded for the cache
    #[error("Serialization Error: {0}")]
    SerializationError(String),

    /// Configuration errors
    #[error("Config Error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for EventError {
    fn from(err: serde_json::Error) -> Self {
        EventError::SerializationError(format!("JSON serialization/deserialization error: {}", err))
    }
}

impl From<quick_xml::DeError> for EventError {
    fn from(err: quick_xml::DeError) -> Self {
        EventError::DecodeError(format!("XML deserialization error: {}", err))
    }
}

impl From<redis::RedisError> for EventError {
    fn from(err: redis::RedisError) -> Self {
        EventError::CacheUnavailable(format!("Redis error: {}", err))
    }
}

impl From<reqwest::Error> for EventError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EventError::UpstreamTimeout(format!("Provider request timed out: {}", err))
        } else {
            EventError::UpstreamUnavailable(format!("Provider request failed: {}", err))
        }
    }
}

impl EventError {
    /// Whether the service can recover from this error without failing the request
    pub fn is_recoverable(&self) -> bool {
        match self {
            EventError::CacheUnavailable(_) => true, // falls through to the provider
            EventError::UpstreamUnavailable(_) => true, // may be served from the stale copy
            EventError::UpstreamTimeout(_) => true,
            EventError::ParseError(_) => false,
            EventError::InvalidRange(_) => false,
            EventError::DecodeError(_) => false, // never masked as zero events
            EventError::SerializationError(_) => false,
            EventError::ConfigError(_) => false,
        }
    }

    /// Categorizes error for logging and status mapping
    pub fn categorize(&self) -> ErrorCategory {
        match self {
            EventError::ParseError(_) | EventError::InvalidRange(_) => ErrorCategory::Client,
            EventError::DecodeError(_)
            | EventError::UpstreamUnavailable(_)
            | EventError::UpstreamTimeout(_) => ErrorCategory::Upstream,
            EventError::CacheUnavailable(_) | EventError::SerializationError(_) => {
                ErrorCategory::Infrastructure
            }
            EventError::ConfigError(_) => ErrorCategory::Configuration,
        }
    }

    /// Short machine-readable name, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            EventError::ParseError(_) => "parse_error",
            EventError::InvalidRange(_) => "invalid_range",
            EventError::DecodeError(_) => "decode_error",
            EventError::UpstreamUnavailable(_) => "upstream_unavailable",
            EventError::UpstreamTimeout(_) => "upstream_timeout",
            EventError::CacheUnavailable(_) => "cache_unavailable",
            EventError::SerializationError(_) => "serialization_error",
            EventError::ConfigError(_) => "config_error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Client,
    Upstream,
    Infrastructure,
    Configuration,
}

pub type Result<T> = std::result::Result<T, EventError>;
