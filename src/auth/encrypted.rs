//! Encrypted file storage for the session cookie.
//!
//! Fallback for hosts without a usable OS keyring (headless servers,
//! containers) and the durable copy on every store. The file lives at
//! `{config_dir}/credentials.enc` and holds `BASE64(nonce || ciphertext)`.
//! Writes go to a uniquely named owner-only temp file in the same directory
//! that is renamed over the target, so readers never see a partial file and
//! concurrent writers never share a temp path.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::backend::CredentialBackend;
use super::crypto::{decrypt_secret, encrypt_secret, CryptoError};
use super::kdf::{derive_local_key, DerivedKey};
use super::types::{CredentialResult, SessionSecret};

/// File name inside the config directory.
pub const CREDENTIALS_FILE_NAME: &str = "credentials.enc";

#[derive(Debug, Error)]
enum StorageError {
    #[error("{0}")]
    Crypto(#[from] CryptoError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("Decrypted value is empty")]
    Empty,
}

/// AES-256-GCM credential file keyed to this machine.
#[derive(Debug)]
pub struct EncryptedCredentialStore {
    path: PathBuf,
    key: DerivedKey,
}

impl EncryptedCredentialStore {
    /// Store in `config_dir`, keyed to the current host and optional password.
    pub fn new(config_dir: impl AsRef<Path>, password: Option<&str>) -> Self {
        Self::with_key(
            config_dir.as_ref().join(CREDENTIALS_FILE_NAME),
            derive_local_key(password),
        )
    }

    /// Store at an explicit file path with an explicit key.
    pub fn with_key(path: PathBuf, key: DerivedKey) -> Self {
        Self { path, key }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_blob(&self, secret: &SessionSecret) -> Result<(), StorageError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;
        restrict_permissions(parent, 0o700);

        let blob = encrypt_secret(&self.key, secret.expose())?;

        // NamedTempFile is created 0600 and removed on drop if never persisted.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(blob.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn read_blob(&self) -> Result<SessionSecret, StorageError> {
        let contents = std::fs::read_to_string(&self.path)?;
        let plaintext = decrypt_secret(&self.key, &contents)?;
        SessionSecret::new(plaintext).ok_or(StorageError::Empty)
    }
}

impl CredentialBackend for EncryptedCredentialStore {
    fn is_available(&self) -> bool {
        true
    }

    fn store(&self, secret: &str) -> CredentialResult {
        let Some(secret) = SessionSecret::new(secret) else {
            return CredentialResult::failed("Cookie value cannot be empty");
        };

        match self.write_blob(&secret) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "stored credential in encrypted file");
                CredentialResult::ok("Credential stored in encrypted file")
            }
            Err(e) => {
                tracing::warn!("Failed to write encrypted credential file: {}", e);
                CredentialResult::failed(format!("Encryption error: {}", e))
            }
        }
    }

    fn get(&self) -> CredentialResult {
        if !self.path.exists() {
            return CredentialResult::failed("No credential file found");
        }

        match self.read_blob() {
            Ok(secret) => CredentialResult::found("Credential retrieved", secret),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Could not decrypt credential file: {}",
                    e
                );
                CredentialResult::failed(format!(
                    "Decryption error: {}. File may be corrupted.",
                    e
                ))
            }
        }
    }

    fn clear(&self) -> CredentialResult {
        match std::fs::remove_file(&self.path) {
            Ok(()) => CredentialResult::ok("Credential file removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                CredentialResult::ok("No credential file to clear")
            }
            Err(e) => CredentialResult::failed(format!("Error removing file: {}", e)),
        }
    }
}

/// Best-effort chmod. Platforms without Unix modes skip it; failures are logged.
#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)) {
        tracing::warn!(
            path = %path.display(),
            "Could not set permissions to {:o}: {}",
            mode,
            e
        );
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) {}
