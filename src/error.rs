//! Request-path error taxonomy.
//!
//! Every variant degrades to a client-visible response; none of them is
//! fatal to the process.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors raised while hashing, selecting, or forwarding a request.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// The client address could not be turned into a selection key.
    #[error("invalid address {0:?}")]
    InvalidAddress(String),

    /// Every backend in the pool is currently marked unhealthy.
    #[error("no healthy backends")]
    NoHealthyBackends,

    /// The selected backend could not be reached (connect, DNS, timeout).
    #[error("upstream {backend} unavailable: {reason}")]
    UpstreamUnavailable { backend: String, reason: String },
}

impl BalancerError {
    /// Status code reported to the original caller.
    pub fn status(&self) -> StatusCode {
        match self {
            BalancerError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            BalancerError::NoHealthyBackends | BalancerError::UpstreamUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for BalancerError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
