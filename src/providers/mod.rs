// Providers layer - Work performers and business logic
//
// Providers perform a single kind of work (hashing, key handling, token
// encryption, membership checks) that coordinators compose.

pub mod authorization_provider;
pub mod credential_hasher;
pub mod key_manager;
pub mod token_codec;

pub use authorization_provider::AuthorizationProvider;
pub use credential_hasher::CredentialHasher;
pub use key_manager::{KeyManager, SymmetricKey};
pub use token_codec::TokenCodec;
