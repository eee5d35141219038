use axum::{http::StatusCode, response::IntoResponse};

use crate::secrets::SecretsError;

/// HTTP-facing error. Bodies are plain text carrying the error message.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let message = match self {
            ApiError::Unauthorized(msg) | ApiError::Internal(msg) => msg,
        };

        (status, message).into_response()
    }
}

/// Every resolution failure is a 500; the message says which one.
impl From<SecretsError> for ApiError {
    fn from(err: SecretsError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
