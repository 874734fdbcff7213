//! Unified credential storage with automatic backend selection.
//!
//! Reads check, in order: the `TP_AUTH_COOKIE` environment variable, the OS
//! keyring, the encrypted file. Writes always go to the encrypted file first
//! and then, opportunistically, to the keyring. Keyring access can be denied
//! per launching application (e.g. a desktop client spawning the server), so
//! the file is the durable copy. The two are never reconciled; a keyring
//! entry updated elsewhere may diverge from the file.

use std::sync::Arc;

use super::backend::CredentialBackend;
use super::environment::EnvironmentBackend;
use super::types::{Backend, CredentialResult};

/// Single point of truth for the current session cookie.
#[derive(Clone)]
pub struct CredentialResolver {
    env: Arc<dyn CredentialBackend>,
    keyring: Arc<dyn CredentialBackend>,
    file: Arc<dyn CredentialBackend>,
}

impl CredentialResolver {
    pub fn new(
        env: EnvironmentBackend,
        keyring: Arc<dyn CredentialBackend>,
        file: Arc<dyn CredentialBackend>,
    ) -> Self {
        Self {
            env: Arc::new(env),
            keyring,
            file,
        }
    }

    /// Name of the backend a read would currently be served from.
    ///
    /// Reporting only; it does not influence `get`/`store`/`clear`.
    pub fn storage_backend(&self) -> Backend {
        if self.env.is_available() {
            Backend::Environment
        } else if self.keyring.is_available() {
            Backend::Keyring
        } else {
            Backend::EncryptedFile
        }
    }

    /// Current secret: environment > keyring > encrypted file.
    pub fn get(&self) -> CredentialResult {
        let env = self.env.get();
        if env.success {
            tracing::debug!("using credential from environment variable");
            return env;
        }

        if self.keyring.is_available() {
            let result = self.keyring.get();
            if result.success {
                tracing::debug!("using credential from keyring");
                return result;
            }
            tracing::debug!("keyring lookup failed: {}", result.message);
        }

        self.file.get()
    }

    /// Store in the encrypted file, then in the keyring if one is available.
    pub fn store(&self, secret: &str) -> CredentialResult {
        let file_result = self.file.store(secret);

        if self.keyring.is_available() {
            let keyring_result = self.keyring.store(secret);
            if keyring_result.success {
                if file_result.success {
                    return CredentialResult::ok("Credential stored in keyring and encrypted file");
                }
                tracing::warn!(
                    "Encrypted file write failed, credential only in keyring: {}",
                    file_result.message
                );
                return CredentialResult::ok(format!(
                    "Credential stored in keyring ({})",
                    file_result.message
                ));
            }
            tracing::warn!("Keyring write failed: {}", keyring_result.message);
        }

        file_result
    }

    /// Remove the secret from the keyring (if available) and the encrypted file.
    pub fn clear(&self) -> CredentialResult {
        let mut results = Vec::with_capacity(2);

        if self.keyring.is_available() {
            results.push(self.keyring.clear());
        }
        results.push(self.file.clear());

        if results.iter().any(|r| r.success) {
            let nothing_removed = results
                .iter()
                .filter(|r| r.success)
                .all(|r| r.message.starts_with("No credential"));
            if nothing_removed {
                CredentialResult::ok("Credentials cleared (nothing to clear)")
            } else {
                CredentialResult::ok("Credentials cleared")
            }
        } else {
            CredentialResult::failed("No credentials to clear")
        }
    }
}
