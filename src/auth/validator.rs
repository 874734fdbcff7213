//! Session cookie validation against the TrainingPeaks API.
//!
//! One throttled `GET /users/v3/token` per call, classified into
//! [`AuthStatus`]. Network faults and unparsable bodies are reported in the
//! result, never returned as errors. There is no retry loop here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::throttle::Throttle;

pub const TP_API_BASE: &str = "https://tpapi.trainingpeaks.com";
pub const VALIDATION_ENDPOINT: &str = "/users/v3/token";
pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Name of the session cookie the API expects.
pub const AUTH_COOKIE_NAME: &str = "Production_tpAuth";

/// Authentication status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Valid,
    Expired,
    Invalid,
    NetworkError,
    NoCredential,
}

/// Result of authentication validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthResult {
    pub status: AuthStatus,
    pub athlete_id: Option<i64>,
    pub user_id: Option<i64>,
    /// The API's `username` field, which holds the account email.
    pub email: Option<String>,
    pub message: String,
}

impl AuthResult {
    pub fn new(status: AuthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            athlete_id: None,
            user_id: None,
            email: None,
            message: message.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == AuthStatus::Valid
    }
}

/// Anything that can check a session cookie.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, secret: &str) -> AuthResult;
}

/// Validates the session cookie against the remote token endpoint.
#[derive(Debug, Clone)]
pub struct AuthValidator {
    client: Client,
    base_url: String,
    timeout: Duration,
    throttle: Arc<Throttle>,
}

impl AuthValidator {
    pub fn new(base_url: impl Into<String>, timeout: Duration, throttle: Arc<Throttle>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            throttle,
        }
    }

    /// Validator for the production API with the default timeout.
    pub fn production(throttle: Arc<Throttle>) -> Self {
        Self::new(TP_API_BASE, VALIDATION_TIMEOUT, throttle)
    }

    /// Validate a session cookie.
    pub async fn validate(&self, secret: &str) -> AuthResult {
        let secret = secret.trim();
        if secret.is_empty() {
            return AuthResult::new(AuthStatus::NoCredential, "No credential provided");
        }

        self.throttle.wait().await;

        let url = format!("{}{}", self.base_url, VALIDATION_ENDPOINT);
        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, format!("{}={}", AUTH_COOKIE_NAME, secret))
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) if e.is_builder() => {
                // e.g. CR/LF in the cookie; nothing was sent
                tracing::warn!("Auth validation request could not be built");
                return AuthResult::new(
                    AuthStatus::Invalid,
                    "Credential contains characters that cannot be sent in a request header",
                );
            }
            Err(e) => {
                let result = network_failure(&e);
                tracing::warn!("Auth validation failed: {}", result.message);
                return result;
            }
        };

        let status = response.status();
        let body = if status == StatusCode::OK {
            match response.text().await {
                Ok(body) => body,
                Err(e) => return network_failure(&e),
            }
        } else {
            String::new()
        };

        let result = classify_response(status.as_u16(), &body);
        tracing::debug!(status = ?result.status, "auth validation complete");
        result
    }

    /// Blocking variant of [`AuthValidator::validate`].
    ///
    /// Safe to call from any thread. Inside a tokio runtime the request runs
    /// on a scoped helper thread with its own current-thread runtime.
    pub fn validate_blocking(&self, secret: &str) -> AuthResult {
        if tokio::runtime::Handle::try_current().is_err() {
            return self.run_to_completion(secret);
        }
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.run_to_completion(secret))
                .join()
                .unwrap_or_else(|_| {
                    AuthResult::new(AuthStatus::NetworkError, "Validation thread panicked")
                })
        })
    }

    fn run_to_completion(&self, secret: &str) -> AuthResult {
        // pooled connections belong to the runtime that opened them
        let validator = Self {
            client: Client::new(),
            ..self.clone()
        };
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime.block_on(validator.validate(secret)),
            Err(e) => AuthResult::new(
                AuthStatus::NetworkError,
                format!("Could not start async runtime: {}", e),
            ),
        }
    }
}

#[async_trait]
impl SessionValidator for AuthValidator {
    async fn validate(&self, secret: &str) -> AuthResult {
        AuthValidator::validate(self, secret).await
    }
}

/// Classify a token-endpoint response.
pub fn classify_response(status: u16, body: &str) -> AuthResult {
    match status {
        200 => match serde_json::from_str::<Value>(body) {
            Ok(data) => AuthResult {
                status: AuthStatus::Valid,
                athlete_id: data.get("athleteId").and_then(Value::as_i64),
                user_id: data.get("userId").and_then(Value::as_i64),
                email: data
                    .get("username")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                message: "Authentication valid".to_string(),
            },
            Err(_) => AuthResult::new(
                AuthStatus::Valid,
                "Authentication valid, but the account details could not be parsed",
            ),
        },
        401 => AuthResult::new(
            AuthStatus::Expired,
            "Session expired. Please re-authenticate.",
        ),
        403 => AuthResult::new(
            AuthStatus::Invalid,
            "Invalid credentials. Please re-authenticate.",
        ),
        other => AuthResult::new(
            AuthStatus::Invalid,
            format!("Unexpected response: {}", other),
        ),
    }
}

/// reqwest error text includes the URL; keep only the category.
fn network_failure(error: &reqwest::Error) -> AuthResult {
    let message = if error.is_timeout() {
        "Request timed out. Check your network connection."
    } else if error.is_connect() {
        "Network error: connection failed"
    } else {
        "Network error: request failed"
    };
    AuthResult::new(AuthStatus::NetworkError, message)
}
