//! Error types for the SuomiSF server.
//!
//! All user-visible error messages are Finnish and carried in a
//! `{"msg": ...}` body. Storage errors are logged here and collapsed to a
//! generic message so SQL never reaches the transport.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing required field, malformed JSON, bad id, empty title. 400.
    #[error("{0}")]
    BadRequest(String),

    /// Filter field not in allow-list, unknown match mode, stub route. 405.
    #[error("{0}")]
    NotAllowed(String),

    /// Missing or invalid bearer token. 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not an administrator. 403.
    #[error("{0}")]
    Forbidden(String),

    /// Unknown path or id on endpoints that surface it as 404.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate name or deletion blocked by references. Surfaced as 400
    /// like the rest of the validation errors.
    #[error("{0}")]
    Conflict(String),

    #[error("Tietokantavirhe.")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorBody {
    pub msg: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Tietokantavirhe.".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Palvelinvirhe.".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { msg })).into_response()
    }
}

/// Result type alias for application operations.
pub type ApiResult<T> = Result<T, ApiError>;
