//! Shared fixtures for tool tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::auth::encrypted::EncryptedCredentialStore;
use crate::auth::environment::EnvironmentBackend;
use crate::auth::kdf::{DerivedKey, KEY_LENGTH};
use crate::auth::keyring::InMemoryKeyring;
use crate::auth::storage::CredentialResolver;
use crate::auth::validator::{AuthResult, AuthStatus, SessionValidator};

/// Resolver over a temp-dir file store and an unusable keyring.
pub(crate) fn resolver(env: Option<&str>) -> (tempfile::TempDir, CredentialResolver) {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = EncryptedCredentialStore::with_key(
        temp.path().join("credentials.enc"),
        DerivedKey::from_bytes([3u8; KEY_LENGTH]),
    );
    let resolver = CredentialResolver::new(
        EnvironmentBackend::fixed(env),
        Arc::new(InMemoryKeyring::unavailable()),
        Arc::new(file),
    );
    (temp, resolver)
}

/// Returns a canned result and records every secret it was given.
pub(crate) struct FakeValidator {
    result: AuthResult,
    seen: Mutex<Vec<String>>,
}

impl FakeValidator {
    pub fn returning(result: AuthResult) -> Self {
        Self {
            result,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn valid(athlete_id: i64, email: &str) -> Self {
        let mut result = AuthResult::new(AuthStatus::Valid, "Authentication valid");
        result.athlete_id = Some(athlete_id);
        result.email = Some(email.to_string());
        Self::returning(result)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionValidator for FakeValidator {
    async fn validate(&self, secret: &str) -> AuthResult {
        self.seen.lock().unwrap().push(secret.to_string());
        self.result.clone()
    }
}
