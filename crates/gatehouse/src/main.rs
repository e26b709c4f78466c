//! Gatehouse - user registration, authentication and a cache facade over HTTP

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod bootstrap;
mod config;

use crate::config::{CacheBackend, Config, Overrides};
use gatehouse_api::{AppState, create_router};
use crate::bootstrap::bootstrap_admin;
use gatehouse_auth::SessionIssuer;
use gatehouse_db::Database;
use gatehouse_kv::{KvStore, MemoryStore, RedisStore};

/// Gatehouse - user accounts, stateless sessions and a key-value facade
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "GATEHOUSE_CONFIG", default_value = "config/default.toml")]
    config: String,

    /// Database connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Legacy name for the database connection string
    #[arg(long, env = "PG_URL", hide = true)]
    pg_url: Option<String>,

    /// Bind address
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// Port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Cache server host
    #[arg(long, env = "REDIS_HOST")]
    redis_host: Option<String>,

    /// Legacy name for the cache server host
    #[arg(long, env = "REDIS_URL", hide = true)]
    redis_url: Option<String>,

    /// Cache server port
    #[arg(long, env = "REDIS_PORT")]
    redis_port: Option<u16>,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Environment: development, staging, production or test
    #[arg(long = "env")]
    environment: Option<String>,

    /// Environment taken from NODE_ENV
    #[arg(long, env = "NODE_ENV", hide = true)]
    node_env: Option<String>,

    /// Environment taken from ENV
    #[arg(long = "env-var", env = "ENV", hide = true)]
    env_var: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            database_url: self.database_url.clone().or_else(|| self.pg_url.clone()),
            host: self.host.clone(),
            port: self.port,
            cache_host: self.redis_host.clone().or_else(|| self.redis_url.clone()),
            cache_port: self.redis_port,
            jwt_secret: self.jwt_secret.clone(),
            environment: self.environment(),
        }
    }

    /// `--env` wins, then NODE_ENV, then ENV
    fn environment(&self) -> Option<String> {
        self.environment
            .clone()
            .or_else(|| self.node_env.clone())
            .or_else(|| self.env_var.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;
    config.apply_overrides(args.overrides())?;

    // Initialize logging
    init_logging(&config);

    info!(
        "Starting Gatehouse v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );
    config.warn_on_insecure_defaults();

    // Initialize database
    if let Some(dir) = config.database.sqlite_data_dir() {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create data directory {:?}", dir))?;
    }
    let db = Database::new(&config.database.url, config.database.pool_settings())
        .await
        .context("Failed to open database")?;

    bootstrap_admin(&db, config.admin.as_ref())
        .await
        .context("Failed to create bootstrap admin")?;

    // Initialize cache store
    let kv: Arc<dyn KvStore> = match config.cache.backend {
        CacheBackend::Redis => Arc::new(RedisStore::new(
            &config.cache.host,
            config.cache.port,
            config.cache.timeout(),
        )?),
        CacheBackend::Memory => {
            info!("Using in-process cache store");
            Arc::new(MemoryStore::new())
        }
    };

    // Initialize session issuer
    let ttl = config.environment.token_ttl();
    info!("Session tokens expire after {}s", ttl.num_seconds());
    let sessions = Arc::new(SessionIssuer::new(&config.auth.jwt_secret, ttl));

    // Initialize metrics
    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install metrics recorder")?;
        info!("Metrics available at /metrics");
        Some(handle)
    } else {
        None
    };

    // Create application state
    let state = AppState::new(db.clone(), kv, sessions, config.health.probe_timeout());

    // Create router
    let app = create_router(state, metrics_handle)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    // Start server
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind {}:{}",
                    config.server.host, config.server.port
                )
            })?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
