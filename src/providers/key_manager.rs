use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand_core::{OsRng, RngCore};
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::internal::TokenError;

pub const KEY_LENGTH: usize = 32;

/// 256-bit symmetric token key, wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LENGTH]);

impl SymmetricKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TokenError> {
        let key: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| TokenError::KeySizeInvalid {
            expected: KEY_LENGTH,
            actual: bytes.len(),
        })?;
        Ok(Self(key))
    }

    /// Fresh key from the operating system's secure random source
    pub fn generate() -> Result<Self, TokenError> {
        let mut key = [0u8; KEY_LENGTH];
        OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| TokenError::EntropyUnavailable(e.to_string()))?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Owns the process-wide token key and its key file
///
/// The key is resolved once and then shared read-only for the rest of the
/// process. The key file holds exactly the raw key bytes.
///
/// ```text
/// signing_key()       file present -> load
///                     file absent  -> generate, create_new, write
/// verification_key()  file present -> load
///                     file absent  -> KeyUnavailable
/// ```
pub struct KeyManager {
    path: PathBuf,
    key: OnceCell<Arc<SymmetricKey>>,
}

impl KeyManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: OnceCell::new(),
        }
    }

    /// Manager with a fixed in-memory key and no backing file
    pub fn from_key(key: SymmetricKey) -> Self {
        Self {
            path: PathBuf::new(),
            key: OnceCell::new_with(Some(Arc::new(key))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key used to issue tokens, creating the key file on first use
    pub async fn signing_key(&self) -> Result<Arc<SymmetricKey>, TokenError> {
        self.key.get_or_try_init(|| self.load_or_create()).await.cloned()
    }

    /// Key used to verify tokens. Never creates a key file: a token cannot
    /// have been issued under a key that does not exist yet.
    pub async fn verification_key(&self) -> Result<Arc<SymmetricKey>, TokenError> {
        if let Some(key) = self.key.get() {
            return Ok(Arc::clone(key));
        }

        self.key
            .get_or_try_init(|| async {
                self.load()
                    .await?
                    .map(Arc::new)
                    .ok_or(TokenError::KeyUnavailable)
            })
            .await
            .cloned()
    }

    async fn load(&self) -> Result<Option<SymmetricKey>, TokenError> {
        if self.path.as_os_str().is_empty() {
            return Ok(None);
        }

        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let bytes = Zeroizing::new(bytes);
                SymmetricKey::from_bytes(&bytes).map(Some)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TokenError::key_store(&self.path, e)),
        }
    }

    async fn load_or_create(&self) -> Result<Arc<SymmetricKey>, TokenError> {
        if let Some(key) = self.load().await? {
            tracing::debug!(path = %self.path.display(), "Loaded token key");
            return Ok(Arc::new(key));
        }

        let key = SymmetricKey::generate()?;
        match self.persist(&key).await {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "Generated new token key");
                Ok(Arc::new(key))
            }
            // Another process created the file between our read and write
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                self.load().await?.map(Arc::new).ok_or(TokenError::KeyUnavailable)
            }
            Err(e) => Err(TokenError::key_store(&self.path, e)),
        }
    }

    async fn persist(&self, key: &SymmetricKey) -> std::io::Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(std::io::Error::new(ErrorKind::InvalidInput, "no key file configured"));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        file.write_all(key.as_bytes()).await?;
        file.sync_all().await?;
        Ok(())
    }
}

impl fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyManager")
            .field("path", &self.path)
            .field("initialized", &self.key.initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_must_be_exactly_32_bytes() {
        assert!(SymmetricKey::from_bytes(&[7u8; 32]).is_ok());

        let err = SymmetricKey::from_bytes(&[7u8; 16]).unwrap_err();
        assert!(matches!(err, TokenError::KeySizeInvalid { expected: 32, actual: 16 }));
    }

    #[test]
    fn test_key_debug_is_redacted() {
        let key = SymmetricKey::from_bytes(&[0xAB; 32]).unwrap();
        assert_eq!(format!("{:?}", key), "SymmetricKey(<redacted>)");
    }

    #[tokio::test]
    async fn test_signing_key_creates_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("token.key");

        let manager = KeyManager::new(&path);
        let first = manager.signing_key().await.unwrap();
        let second = manager.signing_key().await.unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(std::fs::read(&path).unwrap(), first.as_bytes().to_vec());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_key_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.key");
        KeyManager::new(&path).signing_key().await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_verification_key_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.key");

        let err = KeyManager::new(&path).verification_key().await.unwrap_err();

        assert!(matches!(err, TokenError::KeyUnavailable));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_wrong_sized_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.key");
        std::fs::write(&path, [1u8; 31]).unwrap();

        let err = KeyManager::new(&path).signing_key().await.unwrap_err();
        assert!(matches!(err, TokenError::KeySizeInvalid { expected: 32, actual: 31 }));
    }

    #[tokio::test]
    async fn test_from_key_never_touches_disk() {
        let manager = KeyManager::from_key(SymmetricKey::from_bytes(&[3u8; 32]).unwrap());
        assert_eq!(manager.verification_key().await.unwrap().as_bytes(), &[3u8; 32]);
        assert_eq!(manager.signing_key().await.unwrap().as_bytes(), &[3u8; 32]);
    }
}
