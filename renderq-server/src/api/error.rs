//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::REJECTION_MESSAGE;
use crate::repository::BackingError;
use crate::service::store::StoreError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized,
    UnknownTenant,
    BackingError(BackingError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized => (StatusCode::FORBIDDEN, REJECTION_MESSAGE.to_string()),
            ApiError::UnknownTenant => (StatusCode::NOT_FOUND, "Unknown tenant".to_string()),
            ApiError::BackingError(err) => {
                tracing::error!("Backing store error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<BackingError> for ApiError {
    fn from(err: BackingError) -> Self {
        ApiError::BackingError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(err) => ApiError::BadRequest(err.to_string()),
            StoreError::NotFound(uid) => ApiError::NotFound(format!("Job {} not found", uid)),
            StoreError::Backing(err) => ApiError::BackingError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
