use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::errors::internal::CredentialError;
use crate::types::PasswordHash;

/// Minimum length of a configured pepper
pub const PEPPER_MIN_LENGTH: usize = 16;

const SALT_LENGTH: usize = 16;

/// One-way password hashing with Argon2id
///
/// Every digest carries its own random salt in PHC string form, so hashing
/// the same password twice never yields the same digest. An optional pepper
/// is passed to Argon2 as its secret parameter and never stored.
pub struct CredentialHasher {
    pepper: Option<Zeroizing<String>>,
}

impl CredentialHasher {
    /// # Errors
    /// Returns `CredentialError::InvalidPepper` when a pepper shorter than
    /// `PEPPER_MIN_LENGTH` characters is supplied
    pub fn new(pepper: Option<String>) -> Result<Self, CredentialError> {
        if let Some(pepper) = &pepper {
            if pepper.chars().count() < PEPPER_MIN_LENGTH {
                return Err(CredentialError::InvalidPepper(format!(
                    "pepper must be at least {} characters",
                    PEPPER_MIN_LENGTH
                )));
            }
        }

        Ok(Self {
            pepper: pepper.map(Zeroizing::new),
        })
    }

    /// Hash a plaintext password
    ///
    /// Fails only when the secure random source cannot produce a salt or the
    /// hasher cannot be initialised.
    pub fn hash(&self, plaintext: &str) -> Result<PasswordHash, CredentialError> {
        let mut salt_bytes = [0u8; SALT_LENGTH];
        OsRng
            .try_fill_bytes(&mut salt_bytes)
            .map_err(|e| CredentialError::EntropyUnavailable(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::HashingFailed(e.to_string()))?;

        let digest = self
            .argon2()?
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::HashingFailed(e.to_string()))?
            .to_string();

        Ok(PasswordHash::new(digest))
    }

    /// Check a plaintext password against a stored digest
    ///
    /// Never fails: a malformed digest is simply a mismatch.
    pub fn verify(&self, digest: &PasswordHash, plaintext: &str) -> bool {
        let Ok(parsed) = argon2::PasswordHash::new(digest.as_str()) else {
            tracing::warn!("Stored password digest is not a valid PHC string");
            return false;
        };

        match self.argon2() {
            Ok(argon2) => argon2.verify_password(plaintext.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::error!(error = %e, "Password hasher could not be initialised");
                false
            }
        }
    }

    fn argon2(&self) -> Result<Argon2<'_>, CredentialError> {
        match &self.pepper {
            Some(pepper) => Argon2::new_with_secret(
                pepper.as_bytes(),
                Algorithm::Argon2id,
                Version::V0x13,
                Params::default(),
            )
            .map_err(|e| CredentialError::HashingFailed(e.to_string())),
            None => Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())),
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("pepper", &self.pepper.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_argon2id_phc_string() {
        let hasher = CredentialHasher::new(None).unwrap();
        let digest = hasher.hash("secret1").unwrap();

        assert!(digest.as_str().starts_with("$argon2id$"));
        assert!(hasher.verify(&digest, "secret1"));
        assert!(!hasher.verify(&digest, "secret2"));
    }

    #[test]
    fn test_equal_passwords_get_different_digests() {
        let hasher = CredentialHasher::new(None).unwrap();

        let first = hasher.hash("same-password").unwrap();
        let second = hasher.hash("same-password").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify(&first, "same-password"));
        assert!(hasher.verify(&second, "same-password"));
    }

    #[test]
    fn test_verify_malformed_digest_is_false() {
        let hasher = CredentialHasher::new(None).unwrap();
        assert!(!hasher.verify(&PasswordHash::new("secret1"), "secret1"));
        assert!(!hasher.verify(&PasswordHash::new(""), ""));
    }

    #[test]
    fn test_pepper_binds_the_digest() {
        let peppered = CredentialHasher::new(Some("pepper-0123456789".to_string())).unwrap();
        let plain = CredentialHasher::new(None).unwrap();
        let digest = peppered.hash("secret1").unwrap();

        assert!(peppered.verify(&digest, "secret1"));
        assert!(!plain.verify(&digest, "secret1"));
    }

    #[test]
    fn test_short_pepper_is_rejected() {
        let err = CredentialHasher::new(Some("short".to_string())).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidPepper(_)));
    }

    #[test]
    fn test_debug_does_not_print_pepper() {
        let hasher = CredentialHasher::new(Some("pepper-0123456789".to_string())).unwrap();
        assert!(!format!("{:?}", hasher).contains("pepper-0123456789"));
    }
}
