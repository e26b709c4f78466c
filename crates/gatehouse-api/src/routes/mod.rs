//! API routes

mod auth;
mod cache;
mod health;
pub mod metrics;
pub mod types;
mod users;
mod validate;

use axum::{Router, extract::DefaultBodyLimit, middleware::from_fn_with_state};
use gatehouse_auth::require_auth;

use crate::state::{AppState, MetricsHandle};

/// Request bodies here are small JSON documents
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main router
///
/// Routes behind `require_auth` are answered with 401 before their
/// handler, and therefore any store, is reached.
pub fn create_router(state: AppState, metrics_handle: Option<MetricsHandle>) -> Router {
    let protected = users::protected_routes()
        .route_layer(from_fn_with_state(state.sessions.clone(), require_auth));

    let mut router = Router::new()
        // Health check
        .merge(health::routes())
        // Login
        .merge(auth::routes())
        // Registration and user lookup
        .merge(users::public_routes())
        .merge(protected)
        // Cache facade
        .merge(cache::routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
