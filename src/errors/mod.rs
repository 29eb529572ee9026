// Errors layer - Error type definitions
pub mod internal;
pub mod service;

// Re-exports for convenience
pub use internal::InternalError;
pub use service::{ErrorKind, ServiceError};

#[cfg(test)]
mod service_test;
