//! # secret-cache-proxy
//!
//! A read-through caching proxy in front of a remote secrets store.
//!
//! ## Architecture
//!
//! ```text
//! HTTP API → SecretResolver → TtlStore (key → id, id → secret)
//!                  ↓ miss
//!            SessionGateway (one upstream session at a time)
//!                  ↓
//!            HttpSecretsConnector → upstream secrets service
//! ```
//!
//! Cache hits never touch the upstream. Misses are served through a single
//! serialized session: key lookups list the whole organization once and
//! cache every key, then fetch the one secret requested.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;
pub mod startup;

pub use crate::config::AppConfig;
pub use crate::errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
