//! Environment-variable override for non-interactive runs (CI, containers).

use super::backend::CredentialBackend;
use super::types::{CredentialResult, SessionSecret};

/// Environment variable that overrides every other backend on read.
pub const ENV_VAR_NAME: &str = "TP_AUTH_COOKIE";

#[derive(Debug, Clone)]
enum Source {
    /// Read the process environment on every lookup.
    Process(String),
    /// Fixed value captured up front.
    Fixed(Option<String>),
}

/// Read-only backend backed by an environment variable.
#[derive(Debug, Clone)]
pub struct EnvironmentBackend {
    source: Source,
}

impl EnvironmentBackend {
    /// Look up `TP_AUTH_COOKIE` in the process environment.
    pub fn from_process() -> Self {
        Self::from_var(ENV_VAR_NAME)
    }

    pub fn from_var(name: impl Into<String>) -> Self {
        Self {
            source: Source::Process(name.into()),
        }
    }

    /// Use a fixed value instead of the process environment.
    pub fn fixed(value: Option<&str>) -> Self {
        Self {
            source: Source::Fixed(value.map(str::to_string)),
        }
    }

    fn lookup(&self) -> Option<SessionSecret> {
        match &self.source {
            Source::Process(name) => std::env::var(name).ok().and_then(SessionSecret::new),
            Source::Fixed(value) => value.clone().and_then(SessionSecret::new),
        }
    }
}

impl CredentialBackend for EnvironmentBackend {
    /// True only when the variable holds a non-blank value.
    fn is_available(&self) -> bool {
        self.lookup().is_some()
    }

    fn store(&self, _secret: &str) -> CredentialResult {
        CredentialResult::failed("Environment variable credentials are read-only")
    }

    fn get(&self) -> CredentialResult {
        match self.lookup() {
            Some(secret) => {
                CredentialResult::found("Credential from environment variable", secret)
            }
            None => CredentialResult::failed("Environment variable not set"),
        }
    }

    fn clear(&self) -> CredentialResult {
        CredentialResult::failed("Environment variable credentials are read-only")
    }
}
