use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Symmetric key must be {expected} bytes, got {actual}")]
    KeySizeInvalid { expected: usize, actual: usize },

    #[error("Claims could not be encrypted")]
    EncryptionFailed,

    #[error("Token could not be decrypted or authenticated")]
    DecryptionFailed,

    #[error("Token expired at {expires_at} (now {now})")]
    Expired { expires_at: i64, now: i64 },

    #[error("Token not valid before {not_before} (now {now})")]
    NotYetValid { not_before: i64, now: i64 },

    #[error("Token is malformed: {0}")]
    Malformed(&'static str),

    #[error("No token key has been provisioned")]
    KeyUnavailable,

    #[error("Key store {path} could not be accessed: {source}")]
    KeyStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Claims could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TokenError {
    pub fn key_store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::KeyStore {
            path: path.into(),
            source,
        }
    }
}
