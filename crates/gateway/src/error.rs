//! Unified error handling for the gateway API.
//!
//! Handlers return [`ApiResult`] and use `?` naturally; [`ApiError`] maps each
//! failure onto a status code and a JSON body with a stable `error` field.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::directory::DirectoryError;
use crate::session::SessionStoreError;

/// Where the client should go to recover from an access-gate rejection.
pub const LOGIN_ENTRY_POINT: &str = "/auth/google";
pub const REGISTRATION_ENTRY_POINT: &str = "/complete-registration";

/// API error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_to: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            details,
            redirect_to: None,
        }
    }

    pub fn with_redirect(mut self, target: &str) -> Self {
        self.redirect_to = Some(target.to_string());
        self
    }
}

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid, unexpired session
    #[error("Authentication required")]
    Unauthenticated,

    /// Authenticated, but the registration-completion step is outstanding
    #[error("Registration incomplete")]
    RegistrationIncomplete,

    /// The session's user is no longer in the directory
    #[error("User not found")]
    UserNotFound,

    /// The request body could not be read as the expected JSON shape
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A mandatory registration field was not supplied
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// Logout could not destroy the session
    #[error("Failed to destroy session: {0}")]
    SessionTeardownFailed(String),

    /// Resource or route not found
    #[error("{0} not found")]
    NotFound(String),

    /// Uncaught fault
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::UserNotFound(_) => ApiError::UserNotFound,
            DirectoryError::MissingRequiredField(field) => ApiError::MissingRequiredField(field),
            DirectoryError::Unavailable(msg) => {
                ApiError::Internal(anyhow::anyhow!("User directory unavailable: {}", msg))
            }
        }
    }
}

impl From<SessionStoreError> for ApiError {
    fn from(err: SessionStoreError) -> Self {
        ApiError::Internal(anyhow::anyhow!(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(
                    "Unauthenticated",
                    Some("Please log in to access this resource".to_string()),
                )
                .with_redirect(LOGIN_ENTRY_POINT),
            ),
            ApiError::RegistrationIncomplete => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new(
                    "RegistrationIncomplete",
                    Some("Please complete your registration first".to_string()),
                )
                .with_redirect(REGISTRATION_ENTRY_POINT),
            ),
            ApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("UserNotFound", None),
            ),
            ApiError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("InvalidRequest", Some(msg.clone())),
            ),
            ApiError::MissingRequiredField(field) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(
                    "MissingRequiredField",
                    Some(format!("{} is required", field)),
                ),
            ),
            ApiError::SessionTeardownFailed(msg) => {
                tracing::error!("Session teardown failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("SessionTeardownFailed", None),
                )
            }
            ApiError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NotFound", Some(format!("{} not found", resource))),
            ),
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("InternalError", None),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
