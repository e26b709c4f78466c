//! Gatehouse Authentication
//!
//! This crate provides password hashing, stateless JWT sessions and
//! the bearer-token middleware that guards authenticated routes.

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use error::AuthError;
pub use jwt::{Claims, SessionIssuer};
pub use middleware::{AuthUser, require_auth};
pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
