//! Authentication middleware for Axum

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use gatehouse_db::Role;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::AuthError;
use crate::jwt::{Claims, SessionIssuer};

/// Authenticated user information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    /// Create from verified JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
        }
    }
}

/// Handlers behind [`require_auth`] take the verified caller as an argument.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Extract bearer token from authorization header
fn extract_bearer_token(header: &str) -> Result<&str, AuthError> {
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeader),
    }
}

/// Authentication middleware
///
/// Rejects the request with 401 unless it carries a valid bearer token.
/// On success the caller's [`AuthUser`] is added to request extensions.
pub async fn require_auth(
    State(issuer): State<Arc<SessionIssuer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = extract_bearer_token(header)?;
    let claims = issuer.verify(token)?;
    let user = AuthUser::from_claims(&claims);

    debug!("Authenticated user: {} ({})", user.id, user.role);

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
