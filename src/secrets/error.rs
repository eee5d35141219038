//! Error types for secret resolution and upstream access.

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors surfaced by the resolver and the upstream gateway.
///
/// None of these are retried inside the crate; callers decide.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// The requested id or key has no upstream record.
    #[error("unable to find secret: {key}")]
    NotFound { key: String },

    /// The upstream rejected the bearer credential.
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The upstream could not be reached.
    #[error("Backend connection failed: {message}")]
    ConnectionFailed { message: String },

    /// The upstream answered with an unexpected status.
    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// An upstream call exceeded its deadline.
    #[error("Upstream {operation} timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// Malformed upstream payload, or a record that failed to serialize.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Session state file could not be written.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid upstream configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },
}

impl SecretsError {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create an authentication failed error.
    pub fn authentication_failed(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: message.into() }
    }

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: message.into() }
    }

    /// Create a backend error.
    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::BackendError { message: message.into() }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create a config error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError { message: message.into() }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AuthenticationFailed { .. } => "auth",
            Self::ConnectionFailed { .. } | Self::BackendError { .. } | Self::Timeout { .. } => {
                "transport"
            }
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
            Self::ConfigError { .. } => "config",
        }
    }

    /// True for failures of the network path to the upstream.
    pub fn is_transport(&self) -> bool {
        self.kind() == "transport"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = SecretsError::not_found("db-pass");
        assert!(matches!(err, SecretsError::NotFound { .. }));
        assert_eq!(err.to_string(), "unable to find secret: db-pass");

        let err = SecretsError::authentication_failed("token expired");
        assert!(matches!(err, SecretsError::AuthenticationFailed { .. }));
        assert_eq!(err.kind(), "auth");

        let err = SecretsError::timeout("list_secrets", 30_000);
        assert_eq!(err.to_string(), "Upstream list_secrets timed out after 30000ms");
    }

    #[test]
    fn test_transport_family() {
        assert!(SecretsError::connection_failed("refused").is_transport());
        assert!(SecretsError::backend_error("502").is_transport());
        assert!(SecretsError::timeout("get_secret", 10).is_transport());
        assert!(!SecretsError::not_found("x").is_transport());
    }

    #[test]
    fn test_serialization_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: SecretsError = json_error.into();
        assert_eq!(err.kind(), "serialization");
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
