//! # Configuration Settings
//!
//! Defines the configuration structure for the proxy.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server configuration
    #[validate(nested)]
    pub server: ServerConfig,

    /// Secret cache configuration
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Upstream secrets service configuration
    #[validate(nested)]
    pub upstream: UpstreamConfig,

    /// Observability configuration
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        for (field, url) in
            [("upstream.api_url", &self.upstream.api_url), ("upstream.identity_url", &self.upstream.identity_url)]
        {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(Error::validation_field(
                    format!("{} must start with 'http://' or 'https://'", field),
                    field,
                ));
            }
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    #[validate(length(min = 1, message = "Host cannot be empty"))]
    pub host: String,

    /// Server port
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Whole-request deadline in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080, request_timeout_seconds: 5 }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Secret cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of both cache layers in seconds
    #[validate(range(min = 1, message = "Secret TTL must be at least 1 second"))]
    pub secret_ttl_seconds: u64,

    /// How often expired entries are reclaimed
    #[validate(range(min = 1, max = 3600, message = "Eviction interval must be between 1 and 3600 seconds"))]
    pub eviction_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { secret_ttl_seconds: 15 * 60, eviction_interval_seconds: 60 }
    }
}

impl CacheConfig {
    pub fn secret_ttl(&self) -> Duration {
        Duration::from_secs(self.secret_ttl_seconds)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_secs(self.eviction_interval_seconds)
    }
}

/// Upstream secrets service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the secrets API
    #[validate(length(min = 1, message = "API URL cannot be empty"))]
    pub api_url: String,

    /// Base URL of the identity (login) service
    #[validate(length(min = 1, message = "Identity URL cannot be empty"))]
    pub identity_url: String,

    /// Organization whose secrets are served by key
    #[validate(length(min = 1, message = "Organization ID is required"))]
    pub org_id: String,

    /// Deadline for each connect and each upstream call
    #[validate(range(min = 1, max = 300, message = "Call timeout must be between 1 and 300 seconds"))]
    pub call_timeout_seconds: u64,

    /// Directory for the session state file (system temp dir when unset)
    pub state_dir: Option<PathBuf>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.bitwarden.com".to_string(),
            identity_url: "https://identity.bitwarden.com".to_string(),
            org_id: String::new(),
            call_timeout_seconds: 30,
            state_dir: None,
        }
    }
}

impl UpstreamConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    pub fn state_dir(&self) -> PathBuf {
        self.state_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,

    /// Serve Prometheus metrics at /metrics
    pub enable_metrics: bool,

    /// Service name attached to log output
    #[validate(length(min = 1, message = "Service name cannot be empty"))]
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: true,
            enable_metrics: true,
            service_name: "secret-cache-proxy".to_string(),
        }
    }
}
