//! User operations

use chrono::Utc;
use sqlx::Row;
use tracing::debug;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    ///
    /// Email uniqueness is enforced by the table constraint, so two
    /// concurrent registrations for one address cannot both succeed.
    pub async fn create_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, phone, password, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(now.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Duplicate(_) => {
                DbError::Duplicate(format!("User with email '{}' already exists", user.email))
            }
            other => other,
        })?;

        let id: i64 = result.try_get("id")?;
        debug!("Inserted user {}", id);

        Ok(User {
            id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
        })
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, phone, password, role, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, name, email, phone, password, role, created_at
            FROM users
            WHERE email = ?
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }
}
