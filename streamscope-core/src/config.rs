//! Centralized configuration for Streamscope.
//!
//! All tunable parameters are defined here so cache lifetimes, provider
//! endpoints, and request limits are not hard-coded across crates.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::catalog::{FetchPolicy, normalize_country};
use crate::{Result, StreamscopeError};

/// Central configuration for all Streamscope components.
///
/// Supports environment variable overrides for runtime customization.
#[derive(Debug, Clone, Default)]
pub struct StreamscopeConfig {
    pub cache: CacheConfig,
    pub provider: ProviderConfig,
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
}

/// Response cache behaviour.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of a cached upstream response
    pub ttl: Duration,
    /// How often the background sweeper runs
    pub sweep_interval: Duration,
    /// How long expired entries are kept for stale fallback
    pub stale_grace: Duration,
    /// Serve expired entries when the provider is unavailable
    pub serve_stale_on_error: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),            // 1 hour
            sweep_interval: Duration::from_secs(300),  // 5 minutes
            stale_grace: Duration::from_secs(3600),
            serve_stale_on_error: true,
        }
    }
}

/// Upstream catalog provider settings.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Value of the `X-RapidAPI-Host` header
    pub api_host: String,
    /// Without a key the demo catalog is served
    pub api_key: Option<String>,
    /// Upper bound on a single provider call
    pub timeout: Duration,
    /// Result pages followed per catalog request
    pub max_pages: u32,
    pub user_agent: &'static str,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://streaming-availability.p.rapidapi.com".to_string(),
            api_host: "streaming-availability.p.rapidapi.com".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_pages: 1,
            user_agent: "streamscope/0.1.0",
        }
    }
}

impl ProviderConfig {
    /// Whether no API key is configured and the demo catalog should be used.
    pub fn uses_demo_data(&self) -> bool {
        self.api_key.as_deref().is_none_or(|key| key.trim().is_empty())
    }
}

/// Request defaults and limits enforced at the edges.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub default_country: String,
    /// Largest `limit` for single-service top lists
    pub max_top_limit: usize,
    /// Largest `limit` for top movies across every service
    pub max_top_movies_all_limit: usize,
    /// Largest `limit` for top rated titles across every service
    pub max_top_rated_all_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_country: crate::catalog::DEFAULT_COUNTRY.to_string(),
            max_top_limit: 100,
            max_top_movies_all_limit: 25,
            max_top_rated_all_limit: 50,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StreamscopeConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Unparseable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(seconds) = env_parse::<u64>("STREAMSCOPE_CACHE_TTL_SECS") {
            config.cache.ttl = Duration::from_secs(seconds);
        }

        if let Some(seconds) = env_parse::<u64>("STREAMSCOPE_SWEEP_INTERVAL_SECS") {
            config.cache.sweep_interval = Duration::from_secs(seconds);
        }

        if let Some(enabled) = env_parse::<bool>("STREAMSCOPE_SERVE_STALE") {
            config.cache.serve_stale_on_error = enabled;
        }

        if let Some(seconds) = env_parse::<u64>("STREAMSCOPE_PROVIDER_TIMEOUT_SECS") {
            config.provider.timeout = Duration::from_secs(seconds);
        }

        if let Some(pages) = env_parse::<u32>("STREAMSCOPE_PROVIDER_MAX_PAGES") {
            config.provider.max_pages = pages.max(1);
        }

        if let Ok(url) = std::env::var("STREAMSCOPE_PROVIDER_URL") {
            config.provider.base_url = url;
        }

        if let Ok(key) = std::env::var("RAPIDAPI_KEY") {
            config.provider.api_key = Some(key).filter(|key| !key.trim().is_empty());
        }

        if let Ok(country) = std::env::var("STREAMSCOPE_DEFAULT_COUNTRY") {
            config.catalog.default_country = country.trim().to_ascii_lowercase();
        }

        if let Some(host) = env_parse::<IpAddr>("STREAMSCOPE_HOST") {
            config.server.host = host;
        }

        if let Some(port) = env_parse::<u16>("STREAMSCOPE_PORT") {
            config.server.port = port;
        }

        config
    }

    /// Creates a configuration for tests: short lifetimes, demo data, any port.
    pub fn for_testing() -> Self {
        Self {
            cache: CacheConfig {
                ttl: Duration::from_secs(60),
                sweep_interval: Duration::from_secs(5),
                stale_grace: Duration::from_secs(60),
                serve_stale_on_error: true,
            },
            provider: ProviderConfig {
                api_key: None,
                timeout: Duration::from_secs(2),
                ..ProviderConfig::default()
            },
            server: ServerConfig {
                host: IpAddr::V4(Ipv4Addr::LOCALHOST),
                port: 0,
            },
            ..Self::default()
        }
    }

    /// Fetch policy derived from the cache and provider sections.
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            ttl: self.cache.ttl,
            provider_timeout: self.provider.timeout,
            serve_stale_on_error: self.cache.serve_stale_on_error,
        }
    }

    /// Checks values that would make the service misbehave.
    ///
    /// # Errors
    /// - `StreamscopeError::Configuration` - Zero TTL, zero sweep interval or timeout, or a bad default country
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl.is_zero() {
            return Err(configuration("cache TTL must be greater than zero"));
        }
        if self.cache.sweep_interval.is_zero() {
            return Err(configuration("sweep interval must be greater than zero"));
        }
        if self.provider.timeout.is_zero() {
            return Err(configuration("provider timeout must be greater than zero"));
        }
        normalize_country(&self.catalog.default_country).map_err(|_| {
            configuration(format!(
                "default country '{}' is not a two-letter code",
                self.catalog.default_country
            ))
        })?;
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable environment value");
            None
        }
    }
}

fn configuration(reason: impl Into<String>) -> StreamscopeError {
    StreamscopeError::Configuration {
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = StreamscopeConfig::default();

        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
        assert!(config.cache.serve_stale_on_error);
        assert_eq!(config.provider.timeout, Duration::from_secs(30));
        assert!(config.provider.uses_demo_data());
        assert_eq!(config.catalog.default_country, "us");
        assert_eq!(config.catalog.max_top_movies_all_limit, 25);
        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:8000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_preset() {
        let config = StreamscopeConfig::for_testing();
        assert_eq!(config.server.port, 0);
        assert_eq!(config.fetch_policy().ttl, Duration::from_secs(60));
        assert_eq!(config.fetch_policy().provider_timeout, Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StreamscopeConfig::default();
        config.cache.ttl = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(StreamscopeError::Configuration { .. })
        ));

        let mut config = StreamscopeConfig::default();
        config.catalog.default_country = "usa".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_api_key_means_demo_data() {
        let provider = ProviderConfig {
            api_key: Some("  ".to_string()),
            ..ProviderConfig::default()
        };
        assert!(provider.uses_demo_data());
    }

    #[test]
    fn test_env_override() {
        unsafe {
            std::env::set_var("STREAMSCOPE_CACHE_TTL_SECS", "120");
            std::env::set_var("STREAMSCOPE_SWEEP_INTERVAL_SECS", "not-a-number");
            std::env::set_var("STREAMSCOPE_SERVE_STALE", "false");
            std::env::set_var("STREAMSCOPE_PROVIDER_TIMEOUT_SECS", "5");
            std::env::set_var("STREAMSCOPE_PROVIDER_URL", "http://localhost:9999");
            std::env::set_var("STREAMSCOPE_DEFAULT_COUNTRY", "GB");
            std::env::set_var("STREAMSCOPE_HOST", "0.0.0.0");
            std::env::set_var("STREAMSCOPE_PORT", "9000");
        }

        let config = StreamscopeConfig::from_env();

        assert_eq!(config.cache.ttl, Duration::from_secs(120));
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(300));
        assert!(!config.cache.serve_stale_on_error);
        assert_eq!(config.provider.timeout, Duration::from_secs(5));
        assert_eq!(config.provider.base_url, "http://localhost:9999");
        assert_eq!(config.catalog.default_country, "gb");
        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:9000");

        // Clean up
        unsafe {
            std::env::remove_var("STREAMSCOPE_CACHE_TTL_SECS");
            std::env::remove_var("STREAMSCOPE_SWEEP_INTERVAL_SECS");
            std::env::remove_var("STREAMSCOPE_SERVE_STALE");
            std::env::remove_var("STREAMSCOPE_PROVIDER_TIMEOUT_SECS");
            std::env::remove_var("STREAMSCOPE_PROVIDER_URL");
            std::env::remove_var("STREAMSCOPE_DEFAULT_COUNTRY");
            std::env::remove_var("STREAMSCOPE_HOST");
            std::env::remove_var("STREAMSCOPE_PORT");
        }
    }
}
