//! Key-value store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KvError {
    #[error("Key-value store unavailable: {0}")]
    Unavailable(String),

    #[error("Unexpected reply: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<redis::RedisError> for KvError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            KvError::Unavailable(err.to_string())
        } else {
            KvError::Protocol(err.to_string())
        }
    }
}
