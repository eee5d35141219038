//! # Error Handling
//!
//! Crate-level error type for startup, configuration and serving. Secret
//! resolution has its own taxonomy in [`crate::secrets::SecretsError`], which
//! converts into [`Error::Secrets`].

use crate::secrets::SecretsError;

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the proxy
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration loading errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration values that failed validation
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Listener bind and serve errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Secret resolution errors
    #[error(transparent)]
    Secrets(#[from] SecretsError),
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(context: S, source: std::io::Error) -> Self {
        Self::Io { source, context: context.into() }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io { source: error, context: "I/O operation failed".to_string() }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::config_with_source("Configuration loading failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = Vec::new();
        collect_field_errors("", &errors, &mut fields);
        fields.sort();

        let first_field = fields.first().map(|(field, _)| field.clone());
        let message = fields
            .into_iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");

        Self::Validation { message, field: first_field }
    }
}

/// Flatten nested validation errors into `(dotted.path, messages)` pairs.
fn collect_field_errors(
    prefix: &str,
    errors: &validator::ValidationErrors,
    out: &mut Vec<(String, Vec<String>)>,
) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path =
            if prefix.is_empty() { field.to_string() } else { format!("{}.{}", prefix, field) };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                out.push((path, messages));
            }
            ValidationErrorsKind::Struct(nested) => collect_field_errors(&path, nested, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_field_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Port {
        #[validate(range(min = 1, message = "Port must be non-zero"))]
        port: u16,
    }

    #[derive(Validate)]
    struct Listener {
        #[validate(nested)]
        server: Port,
    }

    #[test]
    fn test_error_creation() {
        let error = Error::config("Test configuration error");
        assert!(matches!(error, Error::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: Test configuration error");

        let error = Error::validation_field("must not be empty", "upstream.org_id");
        if let Error::Validation { field, .. } = error {
            assert_eq!(field, Some("upstream.org_id".to_string()));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_secrets_error_is_transparent() {
        let error: Error = SecretsError::not_found("db-pass").into();
        assert!(matches!(error, Error::Secrets(_)));
        assert_eq!(error.to_string(), "unable to find secret: db-pass");
    }

    #[test]
    fn test_validation_errors_conversion() {
        let errors = Port { port: 0 }.validate().unwrap_err();
        let error: Error = errors.into();
        assert_eq!(error.to_string(), "Validation error: port: Port must be non-zero");
    }

    #[test]
    fn test_nested_validation_errors_keep_path() {
        let errors = Listener { server: Port { port: 0 } }.validate().unwrap_err();
        let error: Error = errors.into();

        assert!(error.to_string().contains("server.port: Port must be non-zero"));
        if let Error::Validation { field, .. } = error {
            assert_eq!(field, Some("server.port".to_string()));
        }
    }

    #[test]
    fn test_io_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let error: Error = io_error.into();
        assert!(matches!(error, Error::Io { .. }));
    }
}
