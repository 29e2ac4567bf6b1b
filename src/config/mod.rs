//! Configuration loading and validation.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::sample::retry::RetryPolicy;
use crate::sample::SamplerSettings;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Results database connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub base_url: Url,

    /// API key sent as both `apikey` and bearer token.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_usaw_table")]
    pub usaw_table: String,

    #[serde(default = "default_iwf_table")]
    pub iwf_table: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_store_url() -> Url {
    Url::parse("http://localhost:54321").expect("static url")
}

fn default_usaw_table() -> String {
    "meet_results".to_string()
}

fn default_iwf_table() -> String {
    "iwf_results".to_string()
}

fn default_request_timeout() -> u64 {
    8
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_url(),
            api_key: String::new(),
            usaw_table: default_usaw_table(),
            iwf_table: default_iwf_table(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Population sampler tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Budget for a whole sampling pass, counting and fetching included.
    #[serde(default = "default_sampler_timeout")]
    pub overall_timeout_secs: u64,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_sampler_timeout() -> u64 {
    10
}

fn default_retry_delay() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    1
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            overall_timeout_secs: default_sampler_timeout(),
            retry_delay_ms: default_retry_delay(),
            max_retries: default_max_retries(),
        }
    }
}

impl SamplerConfig {
    pub fn settings(&self) -> SamplerSettings {
        SamplerSettings {
            overall_timeout: Duration::from_secs(self.overall_timeout_secs),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub sampler: SamplerConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: StoreConfig::default(),
            sampler: SamplerConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Store request timeout must be greater than 0".to_string(),
            ));
        }

        if self.sampler.overall_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Sampler timeout must be greater than 0".to_string(),
            ));
        }

        if self.sampler.overall_timeout_secs <= self.store.request_timeout_secs {
            return Err(ConfigError::ValidationError(
                "Sampler timeout must exceed the per-request timeout".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
