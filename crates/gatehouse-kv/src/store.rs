//! Key-value store trait

use async_trait::async_trait;

use crate::error::KvError;

/// Key-value store trait
///
/// A thin string-to-string facade. Writes overwrite unconditionally and a
/// missing key is `Ok(None)`, never an error. No expiry is applied.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Check that the store answers
    async fn ping(&self) -> Result<(), KvError>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}
