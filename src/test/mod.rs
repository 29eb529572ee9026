// Test support - Only compiled for unit tests
pub mod utils;
