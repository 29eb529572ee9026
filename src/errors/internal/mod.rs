use thiserror::Error;

pub mod credential;
pub mod database;
pub mod token;
pub mod validation;

pub use credential::CredentialError;
pub use database::{DatabaseError, Violation};
pub use token::TokenError;
pub use validation::ValidationError;

/// Internal error type for store and provider operations
///
/// Carries the storage engine's error as a source. Never crosses the core
/// boundary: coordinators re-classify it into a `ServiceError`.
#[derive(Error, Debug)]
pub enum InternalError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl InternalError {
    pub fn database(operation: &str, source: sea_orm::DbErr) -> InternalError {
        InternalError::Database(DatabaseError::Operation {
            operation: operation.to_string(),
            source,
        })
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> InternalError {
        InternalError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, field: &'static str, value: impl Into<String>) -> InternalError {
        InternalError::Duplicate {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Classify a write failure, turning engine-level constraint violations
    /// into the same kinds the pre-insert checks produce
    pub fn from_write(
        operation: &str,
        entity: &'static str,
        field: &'static str,
        value: &str,
        source: sea_orm::DbErr,
    ) -> InternalError {
        match Violation::of(&source) {
            Some(Violation::Unique) => InternalError::duplicate(entity, field, value),
            Some(Violation::ForeignKey) => InternalError::not_found(entity, value),
            None => InternalError::database(operation, source),
        }
    }
}
