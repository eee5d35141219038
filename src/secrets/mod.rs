//! Secret resolution against a remote secrets store.
//!
//! # Architecture
//!
//! - [`SecretResolver`]: two-level TTL cache (key → id, id → secret) with
//!   lazy population from the upstream
//! - [`SessionGateway`]: serializes all upstream traffic through a single
//!   session, opened and closed per operation
//! - [`SessionConnector`] / [`SecretsSession`]: the seam between the gateway
//!   and a concrete transport
//! - [`HttpSecretsConnector`]: the REST transport used in production
//!
//! ```rust,ignore
//! use secret_cache_proxy::secrets::{HttpSecretsConnector, SecretResolver, SessionGateway};
//!
//! let connector = HttpSecretsConnector::new(api_url, identity_url, timeout)?;
//! let gateway = SessionGateway::new(Arc::new(connector), &state_dir, timeout);
//! let resolver = SecretResolver::with_ttl(Arc::new(gateway), Duration::from_secs(900));
//!
//! let payload = resolver.get_by_key("db-pass", "org-id", &token).await?;
//! ```

pub mod client;
pub mod error;
pub mod gateway;
pub mod http;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{SecretsSession, SessionConnector};
pub use error::{Result, SecretsError};
pub use gateway::SessionGateway;
pub use http::HttpSecretsConnector;
pub use resolver::{SecretResolver, ID_TO_SECRET_STORE, KEY_TO_ID_STORE};
pub use types::{AccessToken, SecretIdentifier, SecretRecord, SessionState};
