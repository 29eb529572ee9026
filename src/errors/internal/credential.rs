use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password pepper: {0}")]
    InvalidPepper(String),
}
