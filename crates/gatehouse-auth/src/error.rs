//! Authentication error types

use axum::Json;
use axum::http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Authorization header must be a bearer token")]
    InvalidAuthHeader,

    /// Bad signature, malformed token, or claims that do not decode
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error("Password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),

    #[error("Hashing task failed: {0}")]
    HashingTask(#[from] tokio::task::JoinError),
}

impl AuthError {
    /// The caller's credentials were refused, as opposed to a local fault
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::MissingAuthHeader
                | AuthError::InvalidAuthHeader
                | AuthError::InvalidToken
                | AuthError::TokenExpired
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_rejection() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// `WWW-Authenticate` value for a refused request (RFC 6750)
    fn challenge(&self) -> &'static str {
        match self {
            AuthError::InvalidToken | AuthError::TokenExpired => r#"Bearer error="invalid_token""#,
            AuthError::InvalidAuthHeader => r#"Bearer error="invalid_request""#,
            _ => "Bearer",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if !self.is_rejection() {
            error!("{}", self);
            let body = Json(json!({ "error": "Internal server error" }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let mut response =
            (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.to_string() }))).into_response();
        response
            .headers_mut()
            .insert(WWW_AUTHENTICATE, HeaderValue::from_static(self.challenge()));
        response
    }
}
