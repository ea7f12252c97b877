//! Configuration management for LexRank services
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Default PageRank run parameters
    #[serde(default)]
    pub pagerank: PageRankSettings,

    /// Citation validator settings
    #[serde(default)]
    pub validator: ValidatorSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds (does not apply to calculation runs)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Primary database URL (for writes)
    pub url: String,

    /// Read replica URL (optional, falls back to primary)
    pub read_url: Option<String>,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply pending migrations on startup
    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level or EnvFilter directive (debug, info, lexrank_authority=debug, ...)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Service name attached to startup logs
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageRankSettings {
    /// Probability of following a citation rather than teleporting
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f64,

    /// Iteration budget per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Largest per-document change accepted as converged
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Dangling mass handling: "leak" or "redistribute"
    #[serde(default = "default_dangling_strategy")]
    pub dangling_strategy: String,

    /// Concurrent score upserts while persisting a run
    #[serde(default = "default_persist_concurrency")]
    pub persist_concurrency: usize,

    /// Abort a run after this many seconds (unset or 0 = no limit)
    pub run_timeout_secs: Option<u64>,

    /// Trigger a run on this interval (unset = on demand only)
    pub schedule_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ValidatorSettings {
    /// How long a cached validity decision stays fresh
    #[serde(default = "default_validity_ttl")]
    pub cache_ttl_secs: u64,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_max_connections() -> u32 { 20 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_run_migrations() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_metrics_port() -> u16 { 9090 }
fn default_service_name() -> String { "lexrank".to_string() }
fn default_damping_factor() -> f64 { 0.85 }
fn default_max_iterations() -> u32 { 100 }
fn default_convergence_threshold() -> f64 { 0.0001 }
fn default_dangling_strategy() -> String { "leak".to_string() }
fn default_persist_concurrency() -> usize { 16 }
fn default_validity_ttl() -> u64 { 7 * 24 * 60 * 60 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/lexrank".to_string(),
            read_url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: default_run_migrations(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            metrics_port: default_metrics_port(),
            service_name: default_service_name(),
        }
    }
}

impl Default for PageRankSettings {
    fn default() -> Self {
        Self {
            damping_factor: default_damping_factor(),
            max_iterations: default_max_iterations(),
            convergence_threshold: default_convergence_threshold(),
            dangling_strategy: default_dangling_strategy(),
            persist_concurrency: default_persist_concurrency(),
            run_timeout_secs: None,
            schedule_interval_secs: None,
        }
    }
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_validity_ttl(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?

            // Load base config file
            .add_source(File::with_name("config/default").required(false))

            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))

            // Load local overrides
            .add_source(File::with_name("config/local").required(false))

            // Load from environment variables with APP__ prefix
            // e.g., APP__PAGERANK__DAMPING_FACTOR=0.9
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )

            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get the validity cache TTL as Duration
    pub fn validity_ttl(&self) -> Duration {
        Duration::from_secs(self.validator.cache_ttl_secs)
    }

    /// Get the scheduled run interval, if scheduling is enabled
    pub fn schedule_interval(&self) -> Option<Duration> {
        self.pagerank
            .schedule_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            observability: ObservabilityConfig::default(),
            pagerank: PageRankSettings::default(),
            validator: ValidatorSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pagerank.damping_factor, 0.85);
        assert_eq!(config.pagerank.max_iterations, 100);
        assert_eq!(config.pagerank.convergence_threshold, 0.0001);
        assert_eq!(config.pagerank.dangling_strategy, "leak");
    }

    #[test]
    fn test_validity_ttl_is_seven_days() {
        let config = AppConfig::default();
        assert_eq!(config.validity_ttl(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_schedule_disabled_by_default() {
        let mut config = AppConfig::default();
        assert!(config.schedule_interval().is_none());

        config.pagerank.schedule_interval_secs = Some(0);
        assert!(config.schedule_interval().is_none());

        config.pagerank.schedule_interval_secs = Some(3600);
        assert_eq!(config.schedule_interval(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_sections_fill_defaults_from_partial_source() {
        let config: AppConfig = Config::builder()
            .set_override("database.url", "postgres://db/lexrank")
            .and_then(|b| b.set_override("pagerank.damping_factor", 0.9))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .expect("config should deserialize");

        assert_eq!(config.database.url, "postgres://db/lexrank");
        assert_eq!(config.pagerank.damping_factor, 0.9);
        assert_eq!(config.pagerank.max_iterations, 100);
        assert_eq!(config.validator.cache_ttl_secs, 604_800);
    }
}
