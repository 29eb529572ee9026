use std::fmt;

use thiserror::Error;

use super::internal::{DatabaseError, InternalError, TokenError, ValidationError};

/// Stable error kinds exposed to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    DuplicateKey,
    TransactionStartFailed,
    NoActiveTransaction,
    TokenExpired,
    TokenNotYetValid,
    DecryptionFailed,
    KeySizeInvalid,
    Unauthorized,
    Forbidden,
    InternalServerError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::NotFound => "not_found",
            ErrorKind::DuplicateKey => "duplicate_key",
            ErrorKind::TransactionStartFailed => "transaction_start_failed",
            ErrorKind::NoActiveTransaction => "no_active_transaction",
            ErrorKind::TokenExpired => "token_expired",
            ErrorKind::TokenNotYetValid => "token_not_yet_valid",
            ErrorKind::DecryptionFailed => "decryption_failed",
            ErrorKind::KeySizeInvalid => "key_size_invalid",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::InternalServerError => "internal_server_error",
        };
        f.write_str(name)
    }
}

/// Error returned by every public core operation
///
/// Storage-engine errors are logged and collapsed into a message carrying the
/// failing operation's name; the engine's error value never reaches callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Transaction start failed: {0}")]
    TransactionStartFailed(String),

    #[error("No active transaction")]
    NoActiveTransaction,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Token decryption failed")]
    DecryptionFailed,

    #[error("Invalid key size: expected {expected} bytes, got {actual}")]
    KeySizeInvalid { expected: usize, actual: usize },

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::BadRequest(_) => ErrorKind::BadRequest,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            ServiceError::TransactionStartFailed(_) => ErrorKind::TransactionStartFailed,
            ServiceError::NoActiveTransaction => ErrorKind::NoActiveTransaction,
            ServiceError::TokenExpired => ErrorKind::TokenExpired,
            ServiceError::TokenNotYetValid => ErrorKind::TokenNotYetValid,
            ServiceError::DecryptionFailed => ErrorKind::DecryptionFailed,
            ServiceError::KeySizeInvalid { .. } => ErrorKind::KeySizeInvalid,
            ServiceError::InvalidCredentials | ServiceError::Unauthorized(_) => ErrorKind::Unauthorized,
            ServiceError::Forbidden(_) => ErrorKind::Forbidden,
            ServiceError::InternalServerError(_) => ErrorKind::InternalServerError,
        }
    }

    /// HTTP status the transport layer is expected to answer with
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::DuplicateKey => 409,
            ErrorKind::TokenExpired
            | ErrorKind::TokenNotYetValid
            | ErrorKind::DecryptionFailed
            | ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::TransactionStartFailed => 503,
            ErrorKind::NoActiveTransaction
            | ErrorKind::KeySizeInvalid
            | ErrorKind::InternalServerError => 500,
        }
    }

    /// Re-classify an internal error at the core boundary
    ///
    /// `operation` names the failing operation; it is logged and, for
    /// storage failures, becomes the only detail callers see.
    pub fn from_internal(operation: &str, err: InternalError) -> ServiceError {
        match err {
            InternalError::Validation(e) => {
                tracing::warn!(operation, error = %e, "Rejected invalid input");
                ServiceError::BadRequest(e.to_string())
            }
            InternalError::NotFound { .. } => {
                tracing::debug!(operation, error = %err, "Referenced entity not found");
                ServiceError::NotFound(err.to_string())
            }
            InternalError::Duplicate { .. } => {
                tracing::warn!(operation, error = %err, "Uniqueness violation");
                ServiceError::DuplicateKey(err.to_string())
            }
            InternalError::Database(DatabaseError::TransactionBegin { ref source }) => {
                tracing::error!(operation, error = %source, "Could not open transaction");
                ServiceError::TransactionStartFailed(format!("{operation}: storage unavailable"))
            }
            InternalError::Database(e) => {
                tracing::error!(operation, error = %e, "Storage failure");
                ServiceError::InternalServerError(format!("{operation} failed"))
            }
            InternalError::Credential(e) => {
                tracing::error!(operation, error = %e, "Credential failure");
                ServiceError::InternalServerError(format!("{operation} failed"))
            }
            InternalError::Token(e) => ServiceError::from_token(operation, e),
        }
    }

    fn from_token(operation: &str, err: TokenError) -> ServiceError {
        match err {
            TokenError::KeySizeInvalid { expected, actual } => {
                tracing::error!(operation, expected, actual, "Token key has the wrong size");
                ServiceError::KeySizeInvalid { expected, actual }
            }
            TokenError::DecryptionFailed | TokenError::Malformed(_) | TokenError::KeyUnavailable => {
                tracing::debug!(operation, error = %err, "Token rejected");
                ServiceError::DecryptionFailed
            }
            TokenError::Expired { .. } => ServiceError::TokenExpired,
            TokenError::NotYetValid { .. } => ServiceError::TokenNotYetValid,
            TokenError::KeyStore { .. }
            | TokenError::EntropyUnavailable(_)
            | TokenError::EncryptionFailed
            | TokenError::Serialization(_) => {
                tracing::error!(operation, error = %err, "Token subsystem failure");
                ServiceError::InternalServerError(format!("{operation} failed"))
            }
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::BadRequest(err.to_string())
    }
}
