//! Health check endpoints

use axum::{Router, extract::State, http::StatusCode, routing::get};
use std::time::Duration;
use tracing::{debug, warn};

use crate::state::AppState;

/// Run one probe under `limit`, flattening timeout and failure into `Err`
async fn probe<E, F>(name: &str, limit: Duration, fut: F) -> Result<(), String>
where
    E: std::fmt::Display,
    F: Future<Output = Result<(), E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(format!("{}: {}", name, e)),
        Err(_) => Err(format!("{}: no reply within {:?}", name, limit)),
    }
}

/// GET /health
///
/// Both the database and the cache must answer. Failure detail goes to
/// the log only; clients just see `NOT_OK`.
async fn health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    metrics::counter!("gatehouse_health_checks_total").increment(1);

    let (db, kv) = tokio::join!(
        probe("database", state.probe_timeout, state.db.ping()),
        probe("cache", state.probe_timeout, state.kv.ping()),
    );

    match (db, kv) {
        (Ok(()), Ok(())) => {
            debug!("Database and cache are healthy");
            (StatusCode::OK, "OK")
        }
        (db, kv) => {
            for failure in [db.err(), kv.err()].into_iter().flatten() {
                warn!("Health check failed: {}", failure);
            }
            metrics::counter!("gatehouse_health_check_failures_total").increment(1);
            (StatusCode::INTERNAL_SERVER_ERROR, "NOT_OK")
        }
    }
}

/// GET /heartbeat - process liveness only, no dependency checks
async fn heartbeat() -> &'static str {
    "OK"
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/heartbeat", get(heartbeat))
}
