use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use counsel_identity::IdentityError;
use counsel_persist::PersistError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Persist(#[from] PersistError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {what}")),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Persist(PersistError::ThreadNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {id}"))
            }
            ApiError::Persist(PersistError::ThreadItemNotFound(id)) => {
                (StatusCode::NOT_FOUND, format!("Not found: {id}"))
            }
            ApiError::Persist(PersistError::InvalidObjectId(_)) => {
                (StatusCode::BAD_REQUEST, "Invalid id format".to_string())
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Storage error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ApiError::Identity(IdentityError::InvalidToken) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            ApiError::Identity(ref e) => {
                tracing::error!("Identity error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Identity provider error".to_string(),
                )
            }
            ApiError::Internal(ref e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
