//! Authenticated TrainingPeaks API client.
//!
//! Every request goes through the shared [`Throttle`] and carries the session
//! cookie from the [`CredentialResolver`]. Failures come back as an
//! [`ApiResponse`] with an [`ErrorCode`], never as a panic.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use super::error::{ApiError, ErrorCode};
use super::throttle::Throttle;
use crate::auth::storage::CredentialResolver;
use crate::auth::validator::{AUTH_COOKIE_NAME, TP_API_BASE};

/// Default per-request timeout for API calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_ENDPOINT: &str = "/users/v3/user";

/// Outcome of an API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub data: Option<Value>,
    pub error_code: Option<ErrorCode>,
    pub message: String,
}

impl ApiResponse {
    fn success(data: Option<Value>) -> Self {
        Self {
            data,
            error_code: None,
            message: "OK".to_string(),
        }
    }

    fn error(error: ApiError) -> Self {
        Self {
            data: None,
            error_code: Some(error.code),
            message: error.message,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code.is_none()
    }

    pub fn is_error(&self) -> bool {
        self.error_code.is_some()
    }

    /// Error payload in the shape tool callers expect.
    pub fn to_error_value(&self) -> Value {
        serde_json::json!({
            "isError": true,
            "error_code": self.error_code.unwrap_or(ErrorCode::ApiError),
            "message": self.message,
        })
    }
}

/// TrainingPeaks API client.
pub struct TpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    throttle: Arc<Throttle>,
    credentials: CredentialResolver,
    athlete_id: Mutex<Option<i64>>,
}

impl TpClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        throttle: Arc<Throttle>,
        credentials: CredentialResolver,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            throttle,
            credentials,
            athlete_id: Mutex::new(None),
        }
    }

    /// Client for the production API.
    ///
    /// Library API for the data tools, which are not part of this binary.
    pub fn production(throttle: Arc<Throttle>, credentials: CredentialResolver) -> Self {
        Self::new(TP_API_BASE, REQUEST_TIMEOUT, throttle, credentials)
    }

    pub async fn get(&self, endpoint: &str) -> ApiResponse {
        self.request::<()>(Method::GET, endpoint, None).await
    }

    /// JSON POST. Library API for the data tools.
    pub async fn post<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> ApiResponse {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Athlete id of the authenticated user, fetched once and cached.
    ///
    /// Library API for the data tools, which key most endpoints by athlete.
    pub async fn athlete_id(&self) -> Option<i64> {
        let mut cached = self.athlete_id.lock().await;
        if cached.is_none() {
            let response = self.get(USER_ENDPOINT).await;
            *cached = response.data.as_ref().and_then(extract_athlete_id);
        }
        *cached
    }

    async fn request<T: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&T>,
    ) -> ApiResponse {
        let credential = self.credentials.get();
        let Some(secret) = credential.secret() else {
            return ApiResponse::error(ApiError::new(
                ErrorCode::AuthRequired,
                "No credential stored. Run 'tp-mcp auth' to authenticate.",
            ));
        };

        self.throttle.wait().await;

        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self
            .client
            .request(method, &url)
            .header(
                header::COOKIE,
                format!("{}={}", AUTH_COOKIE_NAME, secret.expose()),
            )
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                let error = ApiError::from_transport(&e);
                tracing::warn!(endpoint, "API request failed: {}", error);
                return ApiResponse::error(error);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error = ApiError::from_status(status.as_u16());
            tracing::warn!(endpoint, "API request rejected: {}", error);
            return ApiResponse::error(error);
        }

        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return ApiResponse::error(ApiError::from_transport(&e)),
        };
        if text.trim().is_empty() {
            return ApiResponse::success(None);
        }

        match serde_json::from_str::<Value>(&text) {
            Ok(data) => ApiResponse::success(Some(data)),
            Err(e) => ApiResponse::error(ApiError::new(
                ErrorCode::ApiError,
                format!("Failed to parse response: {}", e),
            )),
        }
    }
}

/// `personId` of the user, or the first entry in `athletes`.
fn extract_athlete_id(data: &Value) -> Option<i64> {
    let user = data.get("user").unwrap_or(data);
    user.get("personId")
        .and_then(Value::as_i64)
        .or_else(|| {
            user.get("athletes")
                .and_then(Value::as_array)
                .and_then(|athletes| athletes.first())
                .and_then(|athlete| athlete.get("athleteId"))
                .and_then(Value::as_i64)
        })
}
