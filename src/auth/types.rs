//! Shared credential types.
//!
//! Anything that carries the session cookie renders it as `<present>` or
//! `<absent>` in `Debug` output. None of these types implement `Display` for
//! the secret itself.

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The `Production_tpAuth` session cookie value.
///
/// Wiped from memory on drop. Use [`SessionSecret::expose`] at the single point
/// where the raw value is needed (building a request header, encrypting).
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Wrap a raw value, trimming surrounding whitespace.
    ///
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let mut raw: String = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            raw.zeroize();
            return None;
        }
        let secret = Self(trimmed.to_string());
        raw.zeroize();
        Some(secret)
    }

    /// The raw cookie value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<present>)")
    }
}

/// Which backend satisfied (or would satisfy) a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Environment,
    Keyring,
    EncryptedFile,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Environment => "environment",
            Backend::Keyring => "keyring",
            Backend::EncryptedFile => "encrypted_file",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of every store / get / clear operation.
///
/// `message` is meant for humans and logs and never contains the secret.
#[derive(Clone)]
pub struct CredentialResult {
    pub success: bool,
    pub message: String,
    pub secret: Option<SessionSecret>,
}

impl CredentialResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            secret: None,
        }
    }

    pub fn found(message: impl Into<String>, secret: SessionSecret) -> Self {
        Self {
            success: true,
            message: message.into(),
            secret: Some(secret),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            secret: None,
        }
    }

    /// Borrow the secret only when the operation succeeded and produced one.
    pub fn secret(&self) -> Option<&SessionSecret> {
        if self.success {
            self.secret.as_ref()
        } else {
            None
        }
    }
}

impl fmt::Debug for CredentialResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret.is_some() {
            "<present>"
        } else {
            "<absent>"
        };
        f.debug_struct("CredentialResult")
            .field("success", &self.success)
            .field("message", &self.message)
            .field("secret", &format_args!("{}", secret))
            .finish()
    }
}
