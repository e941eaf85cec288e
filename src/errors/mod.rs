//! Error handling module for the ToolHub backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INVALID_EMAIL: &str = "INVALID_EMAIL";
    pub const ACCOUNT_NOT_FOUND: &str = "ACCOUNT_NOT_FOUND";
    pub const WRONG_CREDENTIAL: &str = "WRONG_CREDENTIAL";
    pub const RATE_LIMITED: &str = "RATE_LIMITED";
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
}

/// Classified identity-provider failures, mapped to fixed user-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorKind {
    InvalidEmail,
    AccountNotFound,
    WrongCredential,
    RateLimited,
    Other,
}

impl AuthErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidEmail => codes::INVALID_EMAIL,
            AuthErrorKind::AccountNotFound => codes::ACCOUNT_NOT_FOUND,
            AuthErrorKind::WrongCredential => codes::WRONG_CREDENTIAL,
            AuthErrorKind::RateLimited => codes::RATE_LIMITED,
            AuthErrorKind::Other => codes::AUTH_FAILED,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            AuthErrorKind::InvalidEmail => "The email address is not valid",
            AuthErrorKind::AccountNotFound => "No account exists with this email",
            AuthErrorKind::WrongCredential => "Incorrect email or password",
            AuthErrorKind::RateLimited => "Too many attempts. Please try again later",
            AuthErrorKind::Other => "Authentication failed. Please try again",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthErrorKind::InvalidEmail => StatusCode::BAD_REQUEST,
            AuthErrorKind::AccountNotFound | AuthErrorKind::WrongCredential => {
                StatusCode::UNAUTHORIZED
            }
            AuthErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthErrorKind::Other => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No valid session on a guarded route
    Unauthorized(String),
    /// Authenticated but lacking admin privileges
    AccessDenied {
        message: String,
        email: Option<String>,
    },
    /// Resource not found
    NotFound(String),
    /// Validation error, raised before any store call
    Validation(String),
    /// Store failure (network, permission, quota); never retried
    Database(String),
    /// Classified identity-provider failure
    Auth(AuthErrorKind),
    /// Failure talking to an external collaborator (blob store, provider transport)
    Upstream(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(kind) => kind.status_code(),
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::AccessDenied { .. } => codes::ACCESS_DENIED,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Database(_) => codes::DATABASE_ERROR,
            AppError::Auth(kind) => kind.code(),
            AppError::Upstream(_) => codes::UPSTREAM_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::AccessDenied { message, .. } => message.clone(),
            AppError::NotFound(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Database(msg) => msg.clone(),
            AppError::Auth(kind) => kind.user_message().to_string(),
            AppError::Upstream(msg) => msg.clone(),
            AppError::Internal(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AppError::Database(format!("Database error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!("Upstream error: {:?}", err);
        AppError::Upstream(format!("Upstream error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::AccessDenied {
                email: Some(email), ..
            } => Some(serde_json::json!({ "email": email })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
