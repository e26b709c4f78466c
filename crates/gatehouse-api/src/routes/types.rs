//! Request/Response DTOs

use gatehouse_db::User;
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
}

// ==================== User Types ====================

/// Registration request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// User response (without password)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role.as_str().to_string(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub user: UserResponse,
}

// ==================== Cache Types ====================

/// Cache write request
#[derive(Deserialize)]
pub struct CacheSetRequest {
    pub key: String,
    pub value: String,
}

/// Cache entry response; `value` is null for a key that was never set
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntryResponse {
    pub key: String,
    pub value: Option<String>,
}
