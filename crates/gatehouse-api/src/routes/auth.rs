//! Login route

use axum::{Json, Router, extract::State, routing::post};
use gatehouse_auth::verify_password_async;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

use super::types::{LoginRequest, LoginResponse};
use super::validate;

/// POST /login
///
/// Unknown email is 404 and a wrong password is 401.
async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate::email(&request.email)?;
    validate::password(&request.password)?;

    debug!("Login attempt");

    let Some(user) = state.db.get_user_by_email(&request.email).await? else {
        metrics::counter!("gatehouse_logins_total", "outcome" => "unknown_user").increment(1);
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    if !verify_password_async(request.password, user.password_hash.clone()).await? {
        metrics::counter!("gatehouse_logins_total", "outcome" => "bad_password").increment(1);
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    let token = state.sessions.issue(user.id, user.role)?;

    metrics::counter!("gatehouse_logins_total", "outcome" => "success").increment(1);
    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        token,
        expires_in: state.sessions.ttl_seconds(),
    }))
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}
