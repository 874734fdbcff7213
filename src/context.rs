//! Process-wide wiring of the credential backends, throttle and validator.
//!
//! Built once at startup and passed explicitly to the tools and the CLI.

use std::sync::Arc;

use crate::auth::backend::CredentialBackend;
use crate::auth::encrypted::EncryptedCredentialStore;
use crate::auth::environment::EnvironmentBackend;
use crate::auth::keyring::{InMemoryKeyring, OsKeyring};
use crate::auth::storage::CredentialResolver;
use crate::auth::types::{Backend, CredentialResult};
use crate::auth::validator::{AuthResult, AuthValidator};
use crate::client::http::{TpClient, REQUEST_TIMEOUT};
use crate::client::throttle::Throttle;
use crate::config::Config;

/// Everything needed to read, store and check the session cookie.
#[derive(Clone)]
pub struct AuthContext {
    throttle: Arc<Throttle>,
    resolver: CredentialResolver,
    validator: AuthValidator,
    api_base_url: String,
}

impl AuthContext {
    /// Wire up the real backends described by `config`.
    pub fn from_config(config: &Config) -> Self {
        let keyring: Arc<dyn CredentialBackend> = if config.disable_keyring {
            tracing::debug!("keyring disabled by configuration");
            Arc::new(InMemoryKeyring::unavailable())
        } else {
            Arc::new(OsKeyring::default())
        };
        let file = EncryptedCredentialStore::new(&config.config_dir, config.key_password.as_deref());
        tracing::debug!(path = %file.path().display(), "credential file location");

        let resolver = CredentialResolver::new(EnvironmentBackend::from_process(), keyring, Arc::new(file));
        Self::with_resolver(config, resolver)
    }

    /// Use an existing resolver; throttle and validator come from `config`.
    pub fn with_resolver(config: &Config, resolver: CredentialResolver) -> Self {
        let throttle = Arc::new(Throttle::new(config.min_request_interval));
        let validator = AuthValidator::new(
            config.api_base_url.clone(),
            config.request_timeout,
            throttle.clone(),
        );
        Self {
            throttle,
            resolver,
            validator,
            api_base_url: config.api_base_url.clone(),
        }
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    pub fn validator(&self) -> &AuthValidator {
        &self.validator
    }

    pub fn throttle(&self) -> &Arc<Throttle> {
        &self.throttle
    }

    pub fn get_credential(&self) -> CredentialResult {
        self.resolver.get()
    }

    pub fn store_credential(&self, secret: &str) -> CredentialResult {
        self.resolver.store(secret)
    }

    pub fn clear_credential(&self) -> CredentialResult {
        self.resolver.clear()
    }

    pub fn get_storage_backend(&self) -> Backend {
        self.resolver.storage_backend()
    }

    pub async fn validate_auth(&self, secret: &str) -> AuthResult {
        self.validator.validate(secret).await
    }

    /// Synchronous validation; usable from inside or outside a runtime.
    pub fn validate_auth_blocking(&self, secret: &str) -> AuthResult {
        self.validator.validate_blocking(secret)
    }

    /// API client sharing this context's throttle and credentials.
    ///
    /// Library API for the data tools; the binary itself only validates.
    pub fn api_client(&self) -> TpClient {
        TpClient::new(
            self.api_base_url.clone(),
            REQUEST_TIMEOUT,
            self.throttle.clone(),
            self.resolver.clone(),
        )
    }
}
