//! Repository error type and helpers shared by the PostgreSQL repositories

use ccr_core::error::PortalError;
use ccr_core::traits::{Entity, Id};

/// PostgreSQL `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored value could not be mapped back onto the domain model
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    pub fn not_found<E: Entity>(id: Id) -> Self {
        RepositoryError::NotFound {
            entity: E::TYPE_NAME,
            id,
        }
    }

    /// Maps unique-constraint violations to `Conflict`, everything else to `Database`
    pub fn from_insert(err: sqlx::Error, conflict_message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                RepositoryError::Conflict(conflict_message.to_string())
            }
            _ => RepositoryError::Database(err),
        }
    }
}

impl From<RepositoryError> for PortalError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => PortalError::NotFound { entity, id },
            RepositoryError::Conflict(message) => PortalError::Conflict { message },
            RepositoryError::Database(e) => PortalError::Database(e.to_string()),
            RepositoryError::Corrupt(message) => PortalError::Database(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_to_portal_error() {
        let err: PortalError = RepositoryError::Conflict("already assigned".into()).into();
        assert_eq!(err.status_code(), 409);

        let err: PortalError = RepositoryError::Database(sqlx::Error::RowNotFound).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "database_error");
    }

    #[test]
    fn test_from_insert_passes_through_other_errors() {
        let err = RepositoryError::from_insert(sqlx::Error::PoolTimedOut, "dup");
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
