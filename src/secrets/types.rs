//! Upstream record types and the bearer credential wrapper.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Short-lived bearer credential supplied by a client on each request.
///
/// The value is redacted in `Debug` and `Display`, never serialized, and
/// zeroed when dropped. Use [`AccessToken::expose`] only at the point where
/// the token is handed to the upstream.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token. Never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken([REDACTED])")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for AccessToken {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for AccessToken {}

impl From<&str> for AccessToken {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AccessToken {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single secret as returned by the upstream, metadata and value included.
///
/// This is the payload the proxy caches and returns, serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecord {
    pub id: String,
    pub organization_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub note: String,
    pub creation_date: DateTime<Utc>,
    pub revision_date: DateTime<Utc>,
}

/// One `(key, id)` pair from an organization listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretIdentifier {
    pub id: String,
    pub organization_id: String,
    pub key: String,
}

impl SecretIdentifier {
    pub fn new(
        id: impl Into<String>,
        organization_id: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), organization_id: organization_id.into(), key: key.into() }
    }
}

/// Envelope of the organization listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretIdentifiersResponse {
    #[serde(default)]
    pub data: Vec<SecretIdentifier>,
}

/// Envelope of the batch fetch endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecretsResponse {
    #[serde(default)]
    pub data: Vec<SecretRecord>,
}

/// Contents of the per-process session state file.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub session_token: String,
    pub established_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("session_token", &"[REDACTED]")
            .field("established_at", &self.established_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}
