//! API error types and HTTP status classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable error codes surfaced to tool callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No credential stored anywhere
    AuthRequired,
    /// Session cookie rejected as expired (401)
    AuthExpired,
    /// Session cookie rejected (403)
    AuthInvalid,
    /// Resource does not exist (404)
    NotFound,
    /// Remote rate limit hit (429)
    RateLimited,
    /// Timeout or connection failure
    NetworkError,
    /// Request could not be built (bad endpoint, header-unsafe credential)
    ValidationError,
    /// Anything else: unexpected status, unparsable body
    ApiError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::AuthInvalid => "AUTH_INVALID",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::ApiError => "API_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from a TrainingPeaks API call.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status_code: None,
            message: message.into(),
        }
    }

    /// Error for a non-success HTTP status.
    pub fn from_status(status_code: u16) -> Self {
        let code = classify_http_status(status_code);
        let message = match code {
            ErrorCode::AuthExpired => "Session expired. Run 'tp-mcp auth' to re-authenticate.".to_string(),
            ErrorCode::AuthInvalid => "Access denied. Run 'tp-mcp auth' to re-authenticate.".to_string(),
            ErrorCode::NotFound => "Resource not found".to_string(),
            ErrorCode::RateLimited => "Rate limited by TrainingPeaks. Try again shortly.".to_string(),
            _ => format!("Unexpected response: {}", status_code),
        };
        Self {
            code,
            status_code: Some(status_code),
            message,
        }
    }

    /// Error for a transport failure. Only the failure category is kept,
    /// since reqwest messages include the request URL.
    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            return Self::new(
                ErrorCode::ValidationError,
                "Request could not be built. Check the stored credential and endpoint.",
            );
        }
        let message = if error.is_timeout() {
            "Request timed out. Check your network connection."
        } else if error.is_connect() {
            "Network error: connection failed"
        } else {
            "Network error: request failed"
        };
        Self::new(ErrorCode::NetworkError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.code, code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Map a non-success HTTP status to an error code.
pub fn classify_http_status(status: u16) -> ErrorCode {
    match status {
        401 => ErrorCode::AuthExpired,
        403 => ErrorCode::AuthInvalid,
        404 => ErrorCode::NotFound,
        429 => ErrorCode::RateLimited,
        _ => ErrorCode::ApiError,
    }
}
