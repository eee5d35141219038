//! Bearer credential extraction.
//!
//! The proxy does not validate tokens itself; it forwards them to the
//! upstream. It only refuses requests that carry no token at all.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::error::ApiError;
use crate::secrets::AccessToken;

const BEARER_PREFIX: &str = "Bearer ";

/// Access token taken from `Authorization: Bearer <token>`.
#[derive(Debug)]
pub struct BearerToken(pub AccessToken);

impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header =
            parts.headers.get(AUTHORIZATION).and_then(|value| value.to_str().ok()).unwrap_or("");

        match parse_bearer(header) {
            Some(token) => Ok(BearerToken(AccessToken::new(token))),
            None => {
                warn!(path = %parts.uri.path(), "Request without access token rejected");
                Err(ApiError::Unauthorized("No token or invalid token sent".to_string()))
            }
        }
    }
}

/// Strip an optional `Bearer ` prefix; `None` when nothing is left.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let token = header.strip_prefix(BEARER_PREFIX).unwrap_or(header);
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
