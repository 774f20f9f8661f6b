//! Configuration module for IOC Enrichr
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
pub(crate) fn expand_env_vars(s: &str) -> String {
    // Regex to capture ${VAR} or ${VAR:-default}
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        // Append the text before the match
        result.push_str(&s[last_match..full_match.start()]);

        // Get value from env, or use default from regex
        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    // Append the rest of the string after the last match
    result.push_str(&s[last_match..]);

    result
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_service_name")]
    pub service_name: String,

    pub enrich: EnrichConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub tracing: Option<TracingConfig>,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Service name cannot be empty".into(),
            ));
        }

        if self.enrich.concurrency_limit == 0 {
            return Err(ConfigError::ValidationError(
                "enrich.concurrency_limit must be at least 1".into(),
            ));
        }

        if !is_valid_http_url(&self.enrich.endpoint) {
            return Err(ConfigError::ValidationError(
                "Invalid lookup endpoint: must start with http:// or https://".into(),
            ));
        }

        // Validate tracing config if present
        if let Some(ref tracing) = self.tracing {
            if tracing.enabled && !is_valid_http_url(&tracing.otlp.endpoint) {
                return Err(ConfigError::ValidationError(
                    "Invalid OTLP endpoint: must start with http:// or https://".into(),
                ));
            }
        }

        Ok(())
    }

    /// The tracing configuration, with the service name filled in from the
    /// top level when the section is absent.
    pub fn tracing_config(&self) -> TracingConfig {
        let mut tracing = self.tracing.clone().unwrap_or_default();
        if tracing.service_name.is_empty() {
            tracing.service_name = self.service_name.clone();
        }
        tracing
    }
}

/// Enrichment settings: the lookup collaborator and the fan-out bound
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Maximum lookups in flight per fan-out call. Default: 5
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,

    /// Lookup API endpoint. Supports ${VAR} and ${VAR:-default} expansion.
    pub endpoint: String,

    /// Basic-auth user for the lookup API
    #[serde(default)]
    pub username: String,

    /// Basic-auth key for the lookup API
    #[serde(default)]
    pub api_key: String,

    /// Per-lookup HTTP timeout in seconds. Default: 5
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_seconds: u64,
}

fn default_concurrency_limit() -> usize {
    crate::fanout::DEFAULT_CONCURRENCY_LIMIT
}

fn default_lookup_timeout() -> u64 {
    5
}

/// Structured logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Tags applied to every log record
    #[serde(default)]
    pub tags: Vec<String>,

    /// Labels applied to every log record
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Tracing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Enable or disable OTLP export. Default: false
    #[serde(default)]
    pub enabled: bool,

    /// Service name for trace identification. Defaults to the top-level
    /// service name.
    #[serde(default)]
    pub service_name: String,

    /// OTLP exporter configuration
    #[serde(default)]
    pub otlp: OtlpConfig,
}

/// OTLP (OpenTelemetry Protocol) exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtlpConfig {
    /// Collector endpoint. Default: http://localhost:4317
    #[serde(default = "default_otlp_endpoint")]
    pub endpoint: String,

    /// Export timeout in seconds. Default: 10
    #[serde(default = "default_otlp_timeout")]
    pub timeout_seconds: u64,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: default_otlp_endpoint(),
            timeout_seconds: default_otlp_timeout(),
        }
    }
}

fn default_service_name() -> String {
    "ioc-enrichr".to_string()
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_otlp_timeout() -> u64 {
    10
}
