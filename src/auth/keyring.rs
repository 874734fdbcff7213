//! OS secret manager integration.
//!
//! Uses the `keyring` crate for cross-platform access:
//! - macOS: Keychain Services
//! - Linux: Secret Service (D-Bus)
//! - Windows: Credential Manager
//!
//! Availability is checked once per adapter. A platform failure or missing
//! storage access means "unavailable" and makes the resolver fall back to the
//! encrypted file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock};

use super::backend::CredentialBackend;
use super::types::{CredentialResult, SessionSecret};

pub const SERVICE_NAME: &str = "trainingpeaks-mcp";
pub const ACCOUNT_NAME: &str = "production_tpauth";

const UNAVAILABLE_MESSAGE: &str = "No keyring backend available. Use encrypted file storage.";

/// Platform keychain entry for the session cookie.
#[derive(Debug)]
pub struct OsKeyring {
    service: String,
    account: String,
    available: OnceLock<bool>,
}

impl Default for OsKeyring {
    fn default() -> Self {
        Self::new(SERVICE_NAME, ACCOUNT_NAME)
    }
}

impl OsKeyring {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            available: OnceLock::new(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(&self.service, &self.account)
    }

    fn check_availability(&self) -> bool {
        let entry = match self.entry() {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Keyring unavailable: {}", error_category(&e));
                return false;
            }
        };
        match entry.get_password() {
            Ok(_) | Err(keyring::Error::NoEntry) => true,
            Err(e) if is_unavailable(&e) => {
                tracing::debug!("Keyring unavailable: {}", error_category(&e));
                false
            }
            // Present but unreadable (e.g. ambiguous or bad encoding): still a real store.
            Err(_) => true,
        }
    }
}

/// Errors that mean there is no usable platform store.
fn is_unavailable(error: &keyring::Error) -> bool {
    matches!(
        error,
        keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_)
    )
}

/// Category name only. Platform messages can echo attribute values.
fn error_category(error: &keyring::Error) -> &'static str {
    match error {
        keyring::Error::PlatformFailure(_) => "platform failure",
        keyring::Error::NoStorageAccess(_) => "no storage access",
        keyring::Error::NoEntry => "no entry",
        keyring::Error::BadEncoding(_) => "bad encoding",
        keyring::Error::TooLong(_, _) => "attribute too long",
        keyring::Error::Invalid(_, _) => "invalid attribute",
        keyring::Error::Ambiguous(_) => "ambiguous entry",
        _ => "keyring error",
    }
}

fn failure_for(error: &keyring::Error) -> CredentialResult {
    if is_unavailable(error) {
        CredentialResult::failed(UNAVAILABLE_MESSAGE)
    } else {
        CredentialResult::failed(format!("Keyring error: {}", error_category(error)))
    }
}

impl CredentialBackend for OsKeyring {
    fn is_available(&self) -> bool {
        *self.available.get_or_init(|| self.check_availability())
    }

    fn store(&self, secret: &str) -> CredentialResult {
        let Some(secret) = SessionSecret::new(secret) else {
            return CredentialResult::failed("Cookie value cannot be empty");
        };
        match self
            .entry()
            .and_then(|entry| entry.set_password(secret.expose()))
        {
            Ok(()) => {
                tracing::debug!(service = %self.service, "stored credential in keyring");
                CredentialResult::ok("Credential stored in keyring")
            }
            Err(e) => {
                tracing::warn!("Keyring store failed: {}", error_category(&e));
                failure_for(&e)
            }
        }
    }

    fn get(&self) -> CredentialResult {
        match self.entry().and_then(|entry| entry.get_password()) {
            Ok(value) => match SessionSecret::new(value) {
                Some(secret) => CredentialResult::found("Credential retrieved", secret),
                None => CredentialResult::failed("No credential stored"),
            },
            Err(keyring::Error::NoEntry) => CredentialResult::failed("No credential stored"),
            Err(e) => failure_for(&e),
        }
    }

    fn clear(&self) -> CredentialResult {
        match self.entry().and_then(|entry| entry.delete_credential()) {
            Ok(()) => CredentialResult::ok("Credential cleared"),
            Err(keyring::Error::NoEntry) => CredentialResult::ok("No credential to clear"),
            Err(e) if is_unavailable(&e) => {
                CredentialResult::failed("No keyring backend available")
            }
            Err(e) => failure_for(&e),
        }
    }
}

/// Process-local keyring stand-in.
///
/// Behaves like [`OsKeyring`] with a switchable availability flag; useful for
/// tests and for embedding where no platform store should be touched.
#[derive(Debug)]
pub struct InMemoryKeyring {
    value: Mutex<Option<SessionSecret>>,
    available: AtomicBool,
}

impl Default for InMemoryKeyring {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKeyring {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            available: AtomicBool::new(true),
        }
    }

    /// A keyring that reports itself unavailable, like a "null" backend.
    pub fn unavailable() -> Self {
        let keyring = Self::new();
        keyring.set_available(false);
        keyring
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<SessionSecret>> {
        // poisoning leaves the value intact
        self.value.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CredentialBackend for InMemoryKeyring {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn store(&self, secret: &str) -> CredentialResult {
        let Some(secret) = SessionSecret::new(secret) else {
            return CredentialResult::failed("Cookie value cannot be empty");
        };
        if !self.is_available() {
            return CredentialResult::failed(UNAVAILABLE_MESSAGE);
        }
        *self.slot() = Some(secret);
        CredentialResult::ok("Credential stored in keyring")
    }

    fn get(&self) -> CredentialResult {
        if !self.is_available() {
            return CredentialResult::failed(UNAVAILABLE_MESSAGE);
        }
        match self.slot().clone() {
            Some(secret) => CredentialResult::found("Credential retrieved", secret),
            None => CredentialResult::failed("No credential stored"),
        }
    }

    fn clear(&self) -> CredentialResult {
        if !self.is_available() {
            return CredentialResult::failed("No keyring backend available");
        }
        match self.slot().take() {
            Some(_) => CredentialResult::ok("Credential cleared"),
            None => CredentialResult::ok("No credential to clear"),
        }
    }
}
