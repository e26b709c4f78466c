//! Gatehouse Key-Value Layer
//!
//! This crate provides the pass-through string cache used by Gatehouse,
//! backed by Redis in deployment and by an in-process map for tests.

pub mod error;
pub mod memory;
pub mod redis_store;
pub mod store;

pub use error::KvError;
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use store::KvStore;
