//! Database error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Query error: {0}")]
    Query(sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                DbError::Unavailable(err.to_string())
            }
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) => DbError::Unavailable(err.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DbError::Duplicate(db_err.message().to_string())
            }
            other => DbError::Query(other),
        }
    }
}

impl DbError {
    /// Whether the error means the store could not be reached at all
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DbError::Unavailable(_))
    }
}
