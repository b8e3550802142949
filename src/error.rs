use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::store::StoreError;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    /// A rejected write, reported with the entity and an error key clients can switch on.
    BadRequest {
        message: String,
        entity: &'static str,
        key: &'static str,
    },
    InvalidPageRequest(String),
    Store(StoreError),
}

impl AppError {
    pub fn bad_request(message: &str, entity: &'static str, key: &'static str) -> Self {
        AppError::BadRequest {
            message: message.to_string(),
            entity,
            key,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            AppError::BadRequest { message, entity, key } => {
                write!(f, "Bad Request: {message} ({entity}.{key})")
            }
            AppError::InvalidPageRequest(msg) => write!(f, "Invalid Page Request: {msg}"),
            AppError::Store(err) => write!(f, "Store Error: {err}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::BadRequest { message, entity, key } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "entityName": entity, "errorKey": key }),
            ),
            AppError::InvalidPageRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Store(StoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, json!({ "error": msg }))
            }
            AppError::Store(err) => {
                tracing::error!("Store error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(StoreError::from(err))
    }
}
