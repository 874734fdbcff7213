//! Credential storage backends.
//!
//! Supports:
//! - `environment`: read-only override from `TP_AUTH_COOKIE`
//! - `keyring`: the OS secret manager (or the in-memory stand-in)
//! - `encrypted_file`: AES-256-GCM file bound to this machine

use super::types::CredentialResult;

/// Common surface of every place the session cookie can live.
///
/// Every method reports through [`CredentialResult`]; backend faults never
/// escape as errors or panics.
pub trait CredentialBackend: Send + Sync {
    /// Whether the backend can be used at all right now.
    fn is_available(&self) -> bool;

    /// Replace the stored secret.
    fn store(&self, secret: &str) -> CredentialResult;

    /// Read the stored secret.
    fn get(&self) -> CredentialResult;

    /// Remove the stored secret. Removing nothing is a success.
    fn clear(&self) -> CredentialResult;
}
