//! Error taxonomy shared by every operation.

use thiserror::Error;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::models::ValidationError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum MedRecError {
    /// Missing, invalid or expired token, unknown or deactivated user, bad credentials.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated, but the role may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness rule would be violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(
        "Fill limit exceeded: prescription {prescription_id} has used all {ceiling} fills"
    )]
    FillLimitExceeded { prescription_id: i64, ceiling: u32 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persistence failure; the transaction was rolled back.
    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type MedRecResult<T> = Result<T, MedRecError>;

impl From<DbError> for MedRecError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Constraint(msg) => MedRecError::Conflict(msg),
            DbError::NotFound(what) => MedRecError::NotFound(what),
            DbError::Sqlite(e) => MedRecError::StorageFailure(e.to_string()),
        }
    }
}

impl From<AuthError> for MedRecError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::TokenExpired | AuthError::InvalidToken(_) => {
                MedRecError::Unauthenticated(e.to_string())
            }
            AuthError::Hashing(_) | AuthError::Signing(_) => MedRecError::Internal(e.to_string()),
        }
    }
}

impl From<StorageError> for MedRecError {
    fn from(e: StorageError) -> Self {
        MedRecError::StorageFailure(e.to_string())
    }
}

impl From<ValidationError> for MedRecError {
    fn from(e: ValidationError) -> Self {
        MedRecError::InvalidInput(e.0)
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedRecError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedRecError::Internal(format!("Lock poisoned: {}", e))
    }
}
