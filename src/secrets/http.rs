//! HTTP transport for the upstream secrets service.
//!
//! Speaks the upstream's REST API: a login exchanges the caller's access
//! token for a session token, which then authenticates the read endpoints
//! until the session is closed with a logout.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use super::client::{SecretsSession, SessionConnector};
use super::error::{Result, SecretsError};
use super::types::{
    AccessToken, SecretIdentifier, SecretIdentifiersResponse, SecretRecord, SecretsResponse,
    SessionState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    session_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
struct GetByIdsRequest<'a> {
    ids: &'a [String],
}

/// Connector that authenticates against the upstream over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSecretsConnector {
    client: Client,
    api_url: String,
    identity_url: String,
}

impl HttpSecretsConnector {
    /// Build a connector. `request_timeout` bounds every individual HTTP
    /// request, independently of the gateway's call deadline.
    pub fn new(api_url: &str, identity_url: &str, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("secret-cache-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SecretsError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            identity_url: identity_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn identity_url(&self) -> &str {
        &self.identity_url
    }
}

#[async_trait]
impl SessionConnector for HttpSecretsConnector {
    async fn connect(
        &self,
        credential: &AccessToken,
        state_file: &Path,
    ) -> Result<Box<dyn SecretsSession>> {
        let url = format!("{}/auth/login", self.identity_url);
        debug!("POST {}", url);

        let response = send(self.client.post(&url).bearer_auth(credential.expose())).await?;
        let login: LoginResponse = handle_response(response, "session").await?;

        let state = SessionState {
            session_token: login.session_token,
            established_at: Utc::now(),
            expires_in: login.expires_in,
        };
        write_state_file(state_file, &state).await?;
        debug!(state_file = %state_file.display(), expires_in = ?state.expires_in, "Upstream session established");

        Ok(Box::new(HttpSecretsSession {
            client: self.client.clone(),
            api_url: self.api_url.clone(),
            identity_url: self.identity_url.clone(),
            session_token: AccessToken::new(state.session_token.clone()),
        }))
    }
}

/// One authenticated upstream session.
struct HttpSecretsSession {
    client: Client,
    api_url: String,
    identity_url: String,
    session_token: AccessToken,
}

impl HttpSecretsSession {
    fn get(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);
        self.client.get(&url).bearer_auth(self.session_token.expose())
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        debug!("POST {}", url);
        self.client.post(&url).bearer_auth(self.session_token.expose())
    }
}

#[async_trait]
impl SecretsSession for HttpSecretsSession {
    async fn list_secrets(&self, organization_id: &str) -> Result<Vec<SecretIdentifier>> {
        let response = send(self.get(&format!("/organizations/{}/secrets", organization_id))).await?;
        let listing: SecretIdentifiersResponse = handle_response(response, organization_id).await?;
        Ok(listing.data)
    }

    async fn get_secret(&self, id: &str) -> Result<SecretRecord> {
        let response = send(self.get(&format!("/secrets/{}", id))).await?;
        handle_response(response, id).await
    }

    async fn get_secrets_by_ids(&self, ids: &[String]) -> Result<Vec<SecretRecord>> {
        let response = send(self.post("/secrets/get-by-ids").json(&GetByIdsRequest { ids })).await?;
        let batch: SecretsResponse = handle_response(response, &ids.join(",")).await?;
        Ok(batch.data)
    }

    async fn close(&self) -> Result<()> {
        let url = format!("{}/auth/logout", self.identity_url);
        debug!("POST {}", url);
        let response = send(self.client.post(&url).bearer_auth(self.session_token.expose())).await?;
        if !response.status().is_success() {
            return Err(status_error(response.status(), "logout", String::new()));
        }
        Ok(())
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| SecretsError::connection_failed(format!("Upstream request failed: {}", e)))
}

/// Map the response status and decode a JSON body.
async fn handle_response<T: DeserializeOwned>(response: Response, subject: &str) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(|e| {
        SecretsError::connection_failed(format!("Failed to read upstream response: {}", e))
    })?;
    trace!(%status, bytes = body.len(), "Upstream response received");

    if !status.is_success() {
        return Err(status_error(status, subject, body));
    }
    Ok(serde_json::from_str(&body)?)
}

fn status_error(status: StatusCode, subject: &str, body: String) -> SecretsError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SecretsError::authentication_failed(
            format!("Upstream rejected credentials with {}", status),
        ),
        StatusCode::NOT_FOUND => SecretsError::not_found(subject),
        _ if body.is_empty() => SecretsError::backend_error(format!("Upstream returned {}", status)),
        _ => SecretsError::backend_error(format!("Upstream returned {}: {}", status, body)),
    }
}

/// Persist session state, readable by the owner only.
async fn write_state_file(path: &Path, state: &SessionState) -> Result<()> {
    let payload = serde_json::to_vec(state)?;
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(&payload).await?;
    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slashes_trimmed() {
        let connector = HttpSecretsConnector::new(
            "https://api.example.com/",
            "https://identity.example.com//",
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(connector.api_url(), "https://api.example.com");
        assert_eq!(connector.identity_url(), "https://identity.example.com");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "id-1", String::new()),
            SecretsError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "id-1", String::new()),
            SecretsError::AuthenticationFailed { .. }
        ));

        let err = status_error(StatusCode::NOT_FOUND, "id-1", String::new());
        assert_eq!(err.to_string(), "unable to find secret: id-1");

        let err = status_error(StatusCode::BAD_GATEWAY, "id-1", "upstream down".to_string());
        assert!(err.is_transport());
        assert!(err.to_string().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_state_file_written_owner_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session");
        let state = SessionState {
            session_token: "session-abc".to_string(),
            established_at: Utc::now(),
            expires_in: Some(3600),
        };

        write_state_file(&path, &state).await.unwrap();
        // Rewriting the same path replaces the content
        write_state_file(&path, &state).await.unwrap();

        let written: SessionState =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written.session_token, "session-abc");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
