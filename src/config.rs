//! Server configuration loaded from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Insert sample threads when the store starts empty
    pub seed_sample_data: bool,
    /// JSON array of threads to load instead of the built-in samples
    pub seed_file: Option<PathBuf>,
    pub rate_limit: Option<RateLimitConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // 100 requests per 15 minutes
        Self {
            max_requests: 100,
            window: Duration::from_secs(15 * 60),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            seed_sample_data: true,
            seed_file: None,
            rate_limit: Some(RateLimitConfig::default()),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// Load config from environment variables, falling back to defaults
    /// for anything missing or unparseable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env_parse("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = env_parse("PORT").unwrap_or(defaults.port);
        let seed_sample_data = env_flag("SEED_SAMPLE_DATA", defaults.seed_sample_data);
        let seed_file = std::env::var("SEED_FILE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let rate_limit = if env_flag("RATE_LIMIT", true) {
            let fallback = RateLimitConfig::default();
            Some(RateLimitConfig {
                max_requests: env_parse("RATE_LIMIT_MAX").unwrap_or(fallback.max_requests),
                window: env_parse("RATE_LIMIT_WINDOW")
                    .map(Duration::from_secs)
                    .unwrap_or(fallback.window),
            })
        } else {
            None
        };

        tracing::info!(
            %bind_addr,
            port,
            seed_sample_data,
            seed_file = ?seed_file,
            rate_limit_enabled = rate_limit.is_some(),
            "Config loaded"
        );

        Self {
            bind_addr,
            port,
            seed_sample_data,
            seed_file,
            rate_limit,
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "BIND_ADDR",
        "PORT",
        "SEED_SAMPLE_DATA",
        "SEED_FILE",
        "RATE_LIMIT",
        "RATE_LIMIT_MAX",
        "RATE_LIMIT_WINDOW",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = Config::from_env();

        assert_eq!(config, Config::default());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("BIND_ADDR", "127.0.0.1");
        std::env::set_var("PORT", "8080");
        std::env::set_var("SEED_SAMPLE_DATA", "false");
        std::env::set_var("SEED_FILE", "/tmp/threads.json");
        std::env::set_var("RATE_LIMIT_MAX", "10");
        std::env::set_var("RATE_LIMIT_WINDOW", "60");

        let config = Config::from_env();
        clear_env();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(!config.seed_sample_data);
        assert_eq!(config.seed_file, Some(PathBuf::from("/tmp/threads.json")));
        assert_eq!(
            config.rate_limit,
            Some(RateLimitConfig {
                max_requests: 10,
                window: Duration::from_secs(60),
            })
        );
    }

    #[test]
    #[serial]
    fn test_rate_limit_disabled() {
        clear_env();
        std::env::set_var("RATE_LIMIT", "0");
        let config = Config::from_env();
        clear_env();

        assert!(config.rate_limit.is_none());
    }

    #[test]
    #[serial]
    fn test_unparseable_values_fall_back() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        let config = Config::from_env();
        clear_env();

        assert_eq!(config.port, 5000);
    }
}
