//! Database error types.

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// SQLx error (connection, query, etc.)
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Migration error
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Record not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Record already exists
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Status change rejected by the active transition policy
    #[error("cannot move complaint from '{from}' to '{to}'")]
    InvalidTransition { from: String, to: String },

    /// Input rejected before touching the database
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DatabaseError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
