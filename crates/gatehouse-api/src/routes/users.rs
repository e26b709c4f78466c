//! User routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use gatehouse_auth::{AuthUser, hash_password_async};
use gatehouse_db::{DbError, NewUser, Role};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

use super::types::{CreateUserRequest, CreateUserResponse, UserResponse};
use super::validate;

/// POST /users
async fn create_user(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    validate::email(&request.email)?;
    validate::name(&request.name)?;
    validate::password(&request.password)?;
    validate::phone(request.phone.as_deref())?;

    debug!("Registering user");

    let password_hash = hash_password_async(request.password).await?;

    let user = state
        .db
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            phone: request.phone,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| {
            let outcome = match &e {
                DbError::Duplicate(_) => "conflict",
                _ => "error",
            };
            metrics::counter!("gatehouse_registrations_total", "outcome" => outcome).increment(1);
            match e {
                DbError::Duplicate(_) => ApiError::Conflict("Email already registered".to_string()),
                other => ApiError::from(other),
            }
        })?;

    metrics::counter!("gatehouse_registrations_total", "outcome" => "success").increment(1);
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            user: user.into(),
        }),
    ))
}

/// GET /users/{id} (Authenticated)
async fn get_user(
    _auth: AuthUser,
    State(state): State<AppState>,
    PathParam(id): PathParam<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", id)))?;

    Ok(Json(user.into()))
}

/// GET /me (Authenticated)
///
/// The id comes from the verified token, never from the request.
async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User: {}", auth.id)))?;

    Ok(Json(user.into()))
}

/// Routes open to anonymous callers
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/users", post(create_user))
}

/// Routes that require a bearer token; the caller adds the auth layer
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/users/{id}", get(get_user))
        .route("/me", get(me))
}
