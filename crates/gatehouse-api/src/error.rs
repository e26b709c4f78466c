//! API error types

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gatehouse_auth::AuthError;
use gatehouse_db::DbError;
use gatehouse_kv::KvError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Cache error: {0}")]
    Kv(#[from] KvError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

const UNAVAILABLE: &str = "Service unavailable";
const INTERNAL: &str = "Internal server error";

impl ApiError {
    /// Status code and client-facing message
    ///
    /// Messages for 5xx responses are generic; the detail is logged.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::Database(e) => match e {
                DbError::Duplicate(msg) => (StatusCode::CONFLICT, msg.clone()),
                DbError::Unavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
            },
            ApiError::Auth(e) if e.is_rejection() => (e.status(), e.to_string()),
            ApiError::Auth(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
            ApiError::Kv(e) => match e {
                KvError::Unavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Keeps the bearer challenge header on refused credentials
        if let ApiError::Auth(e) = self {
            return e.into_response();
        }

        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            error!("{}", self);
        }

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
