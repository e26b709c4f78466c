//! Application state

use gatehouse_auth::SessionIssuer;
use gatehouse_db::Database;
use gatehouse_kv::KvStore;
use std::sync::Arc;
use std::time::Duration;

/// Prometheus render handle served at `/metrics`
pub type MetricsHandle = metrics_exporter_prometheus::PrometheusHandle;

/// Application state shared across handlers
///
/// Built once at startup; every field is a cheap handle onto a
/// process-wide resource.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub kv: Arc<dyn KvStore>,
    pub sessions: Arc<SessionIssuer>,
    /// Upper bound on each dependency probe in `/health`
    pub probe_timeout: Duration,
}

impl AppState {
    pub fn new(
        db: Database,
        kv: Arc<dyn KvStore>,
        sessions: Arc<SessionIssuer>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            db,
            kv,
            sessions,
            probe_timeout,
        }
    }
}
