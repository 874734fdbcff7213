//! Machine-bound key derivation for the credential file.
//!
//! `key = SHA-256(SALT || fingerprint || password)`. A single hash pass with a
//! fixed salt: the threat model is casual disk or backup exposure on the same
//! machine, not offline brute force.

use std::fmt;

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::fingerprint::MachineFingerprint;

/// Key length in bytes (256 bits for AES-256)
pub const KEY_LENGTH: usize = 32;

/// Domain-separation salt. Changing it invalidates every existing credential file.
const KEY_SALT: &[u8] = b"trainingpeaks-mcp-v1";

/// Symmetric key for the encrypted credential file. Never persisted.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; KEY_LENGTH]);

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

/// Derive the file key from a fingerprint and an optional password.
///
/// An empty password is treated the same as no password.
pub fn derive_key(fingerprint: &MachineFingerprint, password: Option<&str>) -> DerivedKey {
    let mut hasher = Sha256::new();
    hasher.update(KEY_SALT);
    hasher.update(fingerprint.as_bytes());
    if let Some(password) = password.filter(|p| !p.is_empty()) {
        hasher.update(password.as_bytes());
    }
    DerivedKey(hasher.finalize().into())
}

/// Derive the file key for the current host.
pub fn derive_local_key(password: Option<&str>) -> DerivedKey {
    derive_key(&MachineFingerprint::current(), password)
}
