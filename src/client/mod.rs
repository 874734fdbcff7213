//! TrainingPeaks API plumbing: request pacing, error classification and the
//! authenticated HTTP client.

pub mod error;
pub mod http;
pub mod throttle;

#[cfg(test)]
pub(crate) mod test_server;

pub use error::{classify_http_status, ApiError, ErrorCode};
pub use http::{ApiResponse, TpClient};
pub use throttle::{Throttle, MIN_REQUEST_INTERVAL};
