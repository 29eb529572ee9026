use thiserror::Error;

/// Input rejected before any storage access
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be between {min} and {max} characters, got {actual}")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("email must be a valid address: {0}")]
    InvalidEmail(String),

    #[error("{field} must be a positive id, got {value}")]
    InvalidId { field: &'static str, value: u64 },

    #[error("{field} must contain at least one id")]
    EmptyIdList { field: &'static str },
}
