use crate::error::EventError;
use crate::utils::parse_log_level;
use log::warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PROVIDER_URL: &str = "https://provider.code-challenge.feverup.com/api/events";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(EventError::ConfigError(format!(
                "CACHE_BACKEND must be 'redis' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub host: String,
    pub port: u16,
    /// Applied to every store round-trip
    pub timeout: Duration,
    /// Expiry for written-back results; `None` keeps entries forever
    pub ttl: Option<Duration>,
    pub serve_stale: bool,
    /// Expiry for the stale fallback copy; must outlive `ttl`
    pub stale_ttl: Duration,
}

impl CacheConfig {
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            host: "localhost".to_string(),
            port: 6379,
            timeout: Duration::from_millis(2000),
            ttl: Some(Duration::from_secs(300)),
            serve_stale: true,
            stale_ttl: Duration::from_secs(86_400),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROVIDER_URL.to_string(),
            timeout: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub log_level: String,
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable value '{}' for {}; using default", raw, key);
            default
        }),
        None => default,
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; missing or unparseable values use defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let cache_defaults = CacheConfig::default();
        let provider_defaults = ProviderConfig::default();

        let backend = match lookup("CACHE_BACKEND") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}; falling back to redis", e);
                CacheBackend::Redis
            }),
            None => cache_defaults.backend,
        };
        let ttl_secs: u64 = parse_or(&lookup, "CACHE_TTL_SECS", 300);
        let stale_ttl_secs: u64 = parse_or(&lookup, "CACHE_STALE_TTL_SECS", 86_400);

        Config {
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "SERVER_PORT", 8000),
            },
            cache: CacheConfig {
                backend,
                host: lookup("CACHE_HOST").unwrap_or(cache_defaults.host),
                port: parse_or(&lookup, "CACHE_PORT", cache_defaults.port),
                timeout: Duration::from_millis(parse_or(&lookup, "CACHE_TIMEOUT_MS", 2000)),
                ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
                serve_stale: parse_or(
                    &lookup,
                    "SERVE_STALE_ON_UPSTREAM_FAILURE",
                    cache_defaults.serve_stale,
                ),
                stale_ttl: Duration::from_secs(stale_ttl_secs),
            },
            provider: ProviderConfig {
                url: lookup("PROVIDER_URL").unwrap_or(provider_defaults.url),
                timeout: Duration::from_millis(parse_or(&lookup, "PROVIDER_TIMEOUT_MS", 3000)),
            },
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), EventError> {
        if self.cache.backend == CacheBackend::Redis {
            if self.cache.host.trim().is_empty() {
                return Err(EventError::ConfigError("CACHE_HOST cannot be empty".to_string()));
            }
            if self.cache.port == 0 {
                return Err(EventError::ConfigError("CACHE_PORT cannot be 0".to_string()));
            }
        }
        if self.cache.timeout.is_zero() {
            return Err(EventError::ConfigError("CACHE_TIMEOUT_MS must be positive".to_string()));
        }
        if self.cache.serve_stale {
            if self.cache.stale_ttl.is_zero() {
                return Err(EventError::ConfigError(
                    "CACHE_STALE_TTL_SECS must be positive".to_string(),
                ));
            }
            if let Some(ttl) = self.cache.ttl {
                if self.cache.stale_ttl <= ttl {
                    return Err(EventError::ConfigError(format!(
                        "CACHE_STALE_TTL_SECS ({:?}) must be longer than CACHE_TTL_SECS ({:?})",
                        self.cache.stale_ttl, ttl
                    )));
                }
            }
        }
        if self.provider.timeout.is_zero() {
            return Err(EventError::ConfigError(
                "PROVIDER_TIMEOUT_MS must be positive".to_string(),
            ));
        }
        url::Url::parse(&self.provider.url).map_err(|e| {
            EventError::ConfigError(format!("PROVIDER_URL '{}' is invalid: {}", self.provider.url, e))
        })?;
        if parse_log_level(&self.log_level).is_none() {
            return Err(EventError::ConfigError(format!(
                "LOG_LEVEL '{}' is not a known level",
                self.log_level
            )));
        }
        Ok(())
    }

    pub fn log_level_filter(&self) -> log::LevelFilter {
        parse_log_level(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }

    pub fn log_settings(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
    }
}
