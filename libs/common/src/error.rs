//! Custom error types for the common library
//!
//! `DatabaseError` covers everything the store can fail with, `DomainError`
//! is the taxonomy surfaced to the services: validation, authentication,
//! authorization, missing entities and slot conflicts.

use sqlx::Error as SqlxError;
use thiserror::Error;

use crate::{policy::Capability, validation::FieldErrors};

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return DatabaseError::UniqueViolation(constraint);
            }
        }

        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors raised by the session, booking and administration operations
#[derive(Error, Debug)]
pub enum DomainError {
    /// Submitted fields were rejected
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// No valid session accompanies the request
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Valid session without the capability the operation needs
    #[error("Forbidden: {0} requires additional privileges")]
    Forbidden(Capability),

    /// Referenced entity does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// The write collides with existing state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failure that is neither the caller's fault nor the store's
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl DomainError {
    /// Single-field validation failure
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::default();
        errors.add(field, message);
        DomainError::Validation(errors)
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
