//! Redis-backed key-value store

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::error::KvError;
use crate::store::KvStore;

/// Redis store sharing one multiplexed connection across all callers
///
/// The connection is opened on first use rather than at construction, so
/// an unreachable Redis degrades requests and health checks instead of
/// preventing startup.
pub struct RedisStore {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisStore {
    /// Create a store for `host:port`; no connection is made yet
    pub fn new(host: &str, port: u16, op_timeout: Duration) -> Result<Self, KvError> {
        let url = format!("redis://{}:{}/", host, port);
        let client =
            redis::Client::open(url.as_str()).map_err(|e| KvError::Configuration(e.to_string()))?;

        info!("Configured Redis store at {}:{}", host, port);

        Ok(Self {
            client,
            connection: OnceCell::new(),
            op_timeout,
        })
    }

    /// Get a handle on the shared connection, establishing it if needed
    async fn connection(&self) -> Result<ConnectionManager, KvError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                self.client
                    .get_connection_manager()
                    .await
                    .map_err(KvError::from)
            })
            .await?;
        Ok(manager.clone())
    }

    /// Bound a store round trip by the configured timeout
    async fn bounded<T, F>(&self, op: &str, fut: F) -> Result<T, KvError>
    where
        F: Future<Output = Result<T, KvError>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Redis {} timed out after {:?}", op, self.op_timeout);
                Err(KvError::Unavailable(format!("{} timed out", op)))
            }
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        self.bounded("GET", async {
            let mut conn = self.connection().await?;
            let value: Option<String> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.bounded("SET", async {
            let mut conn = self.connection().await?;
            let _: () = conn.set(key, value).await?;
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), KvError> {
        self.bounded("PING", async {
            let mut conn = self.connection().await?;
            let reply: String = redis::cmd("PING").query_async(&mut conn).await?;
            if reply == "PONG" {
                Ok(())
            } else {
                Err(KvError::Protocol(format!("PING answered {}", reply)))
            }
        })
        .await
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
