use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Storage failures, tagged with the step that produced them
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("{operation}: {source}")]
    Operation {
        operation: String,
        #[source]
        source: DbErr,
    },

    #[error("could not open transaction: {source}")]
    TransactionBegin {
        #[source]
        source: DbErr,
    },

    #[error("could not commit transaction: {source}")]
    TransactionCommit {
        #[source]
        source: DbErr,
    },

    #[error("could not roll back transaction: {source}")]
    TransactionRollback {
        #[source]
        source: DbErr,
    },
}

/// Integrity constraint reported by the engine for a failed write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Unique,
    ForeignKey,
}

impl Violation {
    pub fn of(err: &DbErr) -> Option<Violation> {
        match err.sql_err()? {
            SqlErr::UniqueConstraintViolation(_) => Some(Violation::Unique),
            SqlErr::ForeignKeyConstraintViolation(_) => Some(Violation::ForeignKey),
            _ => None,
        }
    }
}
