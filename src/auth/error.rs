// Authentication and authorization error types

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};
use utoipa::ToSchema;

/// Error kinds produced by the registry and the auth pipeline.
///
/// Every variant is recoverable at the request boundary. The internal kinds
/// (`PasswordHashError`, `TokenGenerationError`, `StorageError`, `ConfigError`)
/// render as a generic 500 and keep their details in the log.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Name, email and password are required")]
    MissingData,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Name already taken")]
    DuplicateName,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Missing authorization")]
    MissingToken,

    #[error("Forbidden")]
    Forbidden,

    #[error("User not found")]
    NotFound,

    #[error("Password hashing error")]
    PasswordHashError,

    #[error("Token generation error: {0}")]
    TokenGenerationError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g. "DUPLICATE_EMAIL")
    #[schema(example = "DUPLICATE_EMAIL")]
    pub error_code: String,
    /// Human-readable message, safe to show to clients
    #[schema(example = "Email already registered")]
    pub message: String,
    /// RFC 3339 timestamp of when the error occurred
    pub timestamp: String,
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingData => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail | AuthError::DuplicateName => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::MissingToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::StorageError(_)
            | AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code used in the response body
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingData => "MISSING_DATA",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::DuplicateName => "DUPLICATE_NAME",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::MissingToken => "MISSING_AUTHORIZATION",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::NotFound => "NOT_FOUND",
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::StorageError(_)
            | AuthError::ConfigError(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to send to clients (no internal details)
    pub fn error_message(&self) -> String {
        match self {
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::StorageError(_)
            | AuthError::ConfigError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AuthError::MissingData | AuthError::NotFound => debug!("{}", self),
            AuthError::DuplicateEmail | AuthError::DuplicateName => debug!("Conflict: {}", self),
            AuthError::InvalidCredentials => warn!("Rejected login attempt"),
            AuthError::InvalidToken => warn!("Invalid token attempt"),
            AuthError::MissingToken => warn!("Missing token in request"),
            AuthError::Forbidden => warn!("Forbidden access attempt"),
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::StorageError(_)
            | AuthError::ConfigError(_) => error!("{}", self),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();

        let body = ErrorResponse {
            error_code: self.error_code().to_string(),
            message: self.error_message(),
            timestamp: Utc::now().to_rfc3339(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for AuthError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "rejected request body: {}", rejection.body_text());
        AuthError::MissingData
    }
}

impl From<PathRejection> for AuthError {
    fn from(rejection: PathRejection) -> Self {
        debug!("rejected path parameter: {}", rejection.body_text());
        AuthError::NotFound
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::StorageError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(_: validator::ValidationErrors) -> Self {
        AuthError::MissingData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_match_boundary_contract() {
        assert_eq!(AuthError::MissingData.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::DuplicateName.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::NotFound.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_missing_token_message() {
        assert_eq!(AuthError::MissingToken.error_message(), "Missing authorization");
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AuthError::StorageError("connection refused to 10.0.0.3".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_message(), "Internal server error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_credentials_message_does_not_say_which_field() {
        let msg = AuthError::InvalidCredentials.error_message();
        assert_eq!(msg, "Invalid email or password");
    }
}
