use std::sync::Arc;

use chrono::Utc;
use pasetors::keys::SymmetricKey as PasetoKey;
use pasetors::token::UntrustedToken;
use pasetors::version2::{LocalToken, V2};
use pasetors::Local;
use zeroize::Zeroizing;

use crate::errors::internal::TokenError;
use crate::providers::key_manager::{KeyManager, SymmetricKey, KEY_LENGTH};
use crate::types::internal::auth::TOKEN_TTL_SECONDS;
use crate::types::Claims;

/// Version and purpose prefix of every token
pub const TOKEN_HEADER: &str = "v2.local.";

/// Encrypts claims into opaque session tokens and back
///
/// Tokens are standard PASETO `v2.local` (XChaCha20-Poly1305, nonce derived
/// with BLAKE2b from fresh random bytes) carrying the JSON claims and no
/// footer, so any PASETO v2 implementation holding the key can read them.
pub struct TokenCodec {
    keys: Arc<KeyManager>,
}

impl TokenCodec {
    pub fn new(keys: Arc<KeyManager>) -> Self {
        Self { keys }
    }

    /// Issue a token for `claims`, stamping them with the current time
    pub async fn issue(&self, claims: Claims) -> Result<String, TokenError> {
        self.issue_at(claims, Utc::now().timestamp()).await
    }

    /// Issue a token valid from `now` for `TOKEN_TTL_SECONDS`
    ///
    /// The three timestamp claims of the input are overwritten.
    pub async fn issue_at(&self, mut claims: Claims, now: i64) -> Result<String, TokenError> {
        claims.iat = now;
        claims.nbf = now;
        claims.exp = now + TOKEN_TTL_SECONDS;

        let key = self.keys.signing_key().await?;
        let token = encrypt(&key, &claims)?;
        tracing::debug!(user_id = %claims.user_id, exp = claims.exp, "Token issued");
        Ok(token)
    }

    pub async fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp()).await
    }

    /// Decrypt and check the validity window against `now`
    ///
    /// Fails closed; no claims are returned unless every check passes.
    pub async fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let key = self.keys.verification_key().await?;
        let claims = decrypt(&key, token)?;

        if now < claims.nbf {
            return Err(TokenError::NotYetValid {
                not_before: claims.nbf,
                now,
            });
        }
        if now > claims.exp {
            return Err(TokenError::Expired {
                expires_at: claims.exp,
                now,
            });
        }

        Ok(claims)
    }
}

fn paseto_key(key: &SymmetricKey) -> Result<PasetoKey<V2>, TokenError> {
    let bytes: &[u8] = key.as_bytes();
    PasetoKey::<V2>::from(bytes).map_err(|_| TokenError::KeySizeInvalid {
        expected: KEY_LENGTH,
        actual: bytes.len(),
    })
}

fn encrypt(key: &SymmetricKey, claims: &Claims) -> Result<String, TokenError> {
    let payload = Zeroizing::new(serde_json::to_vec(claims)?);
    LocalToken::encrypt(&paseto_key(key)?, &payload, None).map_err(|_| TokenError::EncryptionFailed)
}

fn decrypt(key: &SymmetricKey, token: &str) -> Result<Claims, TokenError> {
    if !token.starts_with(TOKEN_HEADER) {
        return Err(TokenError::Malformed("unexpected header"));
    }
    let untrusted = UntrustedToken::<Local, V2>::try_from(token)
        .map_err(|_| TokenError::Malformed("token is not PASETO v2.local"))?;

    let plaintext = LocalToken::decrypt(&paseto_key(key)?, &untrusted, None)
        .map(|trusted| Zeroizing::new(trusted.payload().as_bytes().to_vec()))
        .map_err(|_| TokenError::DecryptionFailed)?;

    serde_json::from_slice(&plaintext).map_err(|_| TokenError::Malformed("payload is not a claims object"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_with_key(byte: u8) -> TokenCodec {
        let key = SymmetricKey::from_bytes(&[byte; 32]).unwrap();
        TokenCodec::new(Arc::new(KeyManager::from_key(key)))
    }

    fn claims() -> Claims {
        Claims {
            user_id: "1".to_string(),
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            exp: 0,
            iat: 0,
            nbf: 0,
        }
    }

    #[tokio::test]
    async fn test_issue_then_verify_returns_stamped_claims() {
        let codec = codec_with_key(1);

        let token = codec.issue_at(claims(), 10_000).await.unwrap();
        let verified = codec.verify_at(&token, 10_000).await.unwrap();

        assert!(token.starts_with(TOKEN_HEADER));
        assert_eq!(verified.user_id, "1");
        assert_eq!(verified.username, "alice");
        assert_eq!(verified.email, "alice@x.com");
        assert_eq!((verified.iat, verified.nbf, verified.exp), (10_000, 10_000, 10_900));
    }

    #[tokio::test]
    async fn test_same_claims_encrypt_differently() {
        let codec = codec_with_key(1);

        let first = codec.issue_at(claims(), 5).await.unwrap();
        let second = codec.issue_at(claims(), 5).await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_validity_window_edges() {
        let codec = codec_with_key(1);
        let token = codec.issue_at(claims(), 1_000).await.unwrap();

        assert!(codec.verify_at(&token, 1_900).await.is_ok());
        assert!(matches!(
            codec.verify_at(&token, 1_901).await.unwrap_err(),
            TokenError::Expired { expires_at: 1_900, now: 1_901 }
        ));
        assert!(matches!(
            codec.verify_at(&token, 999).await.unwrap_err(),
            TokenError::NotYetValid { not_before: 1_000, now: 999 }
        ));
    }

    #[tokio::test]
    async fn test_foreign_key_fails_decryption() {
        let token = codec_with_key(1).issue_at(claims(), 0).await.unwrap();

        let err = codec_with_key(2).verify_at(&token, 0).await.unwrap_err();
        assert!(matches!(err, TokenError::DecryptionFailed));
    }

    #[tokio::test]
    async fn test_tampered_token_fails_decryption() {
        let codec = codec_with_key(1);
        let token = codec.issue_at(claims(), 0).await.unwrap();

        // Flip one character in the middle of the body, inside the ciphertext
        let mut chars: Vec<char> = token.chars().collect();
        let middle = TOKEN_HEADER.len() + (chars.len() - TOKEN_HEADER.len()) / 2;
        chars[middle] = if chars[middle] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();

        assert!(matches!(codec.verify_at(&tampered, 0).await.unwrap_err(), TokenError::DecryptionFailed));
    }

    #[tokio::test]
    async fn test_other_header_is_rejected() {
        let codec = codec_with_key(1);
        let token = codec.issue_at(claims(), 0).await.unwrap();
        let relabelled = token.replacen("v2.local.", "v2.public.", 1);

        assert!(matches!(codec.verify_at(&relabelled, 0).await.unwrap_err(), TokenError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_garbage_is_rejected() {
        let codec = codec_with_key(1);

        assert!(matches!(codec.verify_at("", 0).await.unwrap_err(), TokenError::Malformed(_)));
        assert!(matches!(codec.verify_at("v2.local.!!!", 0).await.unwrap_err(), TokenError::Malformed(_)));
        assert!(matches!(
            codec.verify_at("v2.local.AAAA", 0).await.unwrap_err(),
            TokenError::Malformed(_) | TokenError::DecryptionFailed
        ));
    }

    #[tokio::test]
    async fn test_tokens_are_readable_by_paseto_v2() {
        let codec = codec_with_key(9);
        let token = codec.issue_at(claims(), 42).await.unwrap();

        let untrusted = UntrustedToken::<Local, V2>::try_from(token.as_str()).unwrap();
        let key = PasetoKey::<V2>::from(&[9u8; 32][..]).unwrap();
        let payload = LocalToken::decrypt(&key, &untrusted, None).unwrap();

        let json: serde_json::Value = serde_json::from_slice(payload.payload().as_bytes()).unwrap();
        assert_eq!(json["userId"], "1");
        assert_eq!(json["exp"], 942);
        assert_eq!(json["nbf"], 42);
    }

    #[tokio::test]
    async fn test_footer_tokens_are_rejected() {
        let key = PasetoKey::<V2>::from(&[9u8; 32][..]).unwrap();
        let payload = serde_json::to_vec(&claims()).unwrap();
        let with_footer = LocalToken::encrypt(&key, &payload, Some(b"kid")).unwrap();

        let err = codec_with_key(9).verify_at(&with_footer, 0).await.unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_) | TokenError::DecryptionFailed));
    }
}
