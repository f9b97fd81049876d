//! Storage error types.

use thiserror::Error;

/// Errors raised by the team and match stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Row to update does not exist
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Row holds a value the domain model cannot represent
    #[error("Corrupt {entity} row: {reason}")]
    Corrupt { entity: &'static str, reason: String },
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
