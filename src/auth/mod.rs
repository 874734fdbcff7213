//! Credential storage and validation for TrainingPeaks authentication.
//!
//! ## Architecture
//!
//! ```text
//!   get()                         store()            clear()
//!     │                             │                  │
//!     ▼                             ▼                  ▼
//!  TP_AUTH_COOKIE ──► keyring ──► encrypted file   file + keyring
//!  (env override)    (if usable)  (always written)  (both attempted)
//! ```
//!
//! The encrypted file lives at `~/.config/trainingpeaks-mcp/credentials.enc`
//! and is keyed by SHA-256 over a machine fingerprint, so it only decrypts on
//! the host that wrote it.

pub mod backend;
pub mod crypto;
pub mod encrypted;
pub mod environment;
pub mod fingerprint;
pub mod kdf;
pub mod keyring;
pub mod storage;
pub mod types;
pub mod validator;

pub use backend::CredentialBackend;
pub use crypto::CryptoError;
pub use encrypted::EncryptedCredentialStore;
pub use environment::{EnvironmentBackend, ENV_VAR_NAME};
pub use fingerprint::MachineFingerprint;
pub use kdf::{derive_key, DerivedKey};
pub use keyring::{InMemoryKeyring, OsKeyring};
pub use storage::CredentialResolver;
pub use types::{Backend, CredentialResult, SessionSecret};
pub use validator::{AuthResult, AuthStatus, AuthValidator, SessionValidator};
