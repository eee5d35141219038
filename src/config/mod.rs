//! # Configuration Management
//!
//! Configuration is layered, later sources winning:
//!
//! 1. built-in defaults
//! 2. an optional file (`--config`, any format the `config` crate reads)
//! 3. `SECRET_CACHE_*` environment variables, `__` separating sections
//!    (e.g. `SECRET_CACHE_UPSTREAM__ORG_ID`)
//! 4. command-line overrides
//!
//! The result is validated before it is returned.

pub mod settings;

pub use settings::{AppConfig, CacheConfig, ObservabilityConfig, ServerConfig, UpstreamConfig};

use crate::errors::Result;
use config::{Config, Environment, File};
use std::path::Path;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SECRET_CACHE";

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub org_id: Option<String>,
    pub log_level: Option<String>,
}

/// Load configuration from the process environment and an optional file.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<AppConfig> {
    load_config_from(path, environment(), overrides)
}

/// Load configuration with an explicit environment source.
pub fn load_config_from(
    path: Option<&Path>,
    env: Environment,
    overrides: &ConfigOverrides,
) -> Result<AppConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let config: AppConfig = builder
        .add_source(env)
        .set_override_option("server.port", overrides.port.map(i64::from))?
        .set_override_option("upstream.org_id", overrides.org_id.clone())?
        .set_override_option("observability.log_level", overrides.log_level.clone())?
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__").try_parsing(true)
}
