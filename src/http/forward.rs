//! Request forwarding to the selected backend.
//!
//! # Responsibilities
//! - Rewrite the inbound request to target the backend (scheme, authority, Host)
//! - Execute it under a per-forward deadline
//! - Relay upstream status, headers and body back to the caller
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - The deadline covers the response head and the body relay
//! - Dropping the inbound request future drops the outbound request
//! - An upstream error status is relayed as-is; only transport failures are errors
//! - No retry against another backend

use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request, Response, Uri, Version};
use axum::BoxError;
use futures_util::{stream, StreamExt};
use std::io;
use std::time::Duration;
use tokio::time::{self, Instant};

use crate::config::BalancerConfig;
use crate::error::BalancerError;
use crate::http::client::UpstreamClient;
use crate::load_balancer::Backend;

/// Response header naming the backend that served the request.
pub const LB_FROM: HeaderName = HeaderName::from_static("lb-from");

/// Proxies requests to backends.
#[derive(Clone)]
pub struct Forwarder {
    client: UpstreamClient,
    scheme: &'static str,
    timeout: Duration,
    trace: bool,
}

impl Forwarder {
    pub fn new(client: UpstreamClient, config: &BalancerConfig) -> Self {
        Self {
            client,
            scheme: config.upstream.scheme(),
            timeout: config.timeouts.request(),
            trace: config.observability.trace,
        }
    }

    /// Forward `request` to `backend` and return the upstream response.
    pub async fn forward(&self, backend: &Backend, request: Request<Body>) -> Result<Response<Body>, BalancerError> {
        let deadline = Instant::now() + self.timeout;
        let (mut parts, body) = request.into_parts();

        let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let target: Uri = format!("{}://{}{}", self.scheme, backend.address, path_and_query)
            .parse()
            .map_err(|e| unavailable(backend, e))?;

        parts.uri = target.clone();
        parts.version = Version::HTTP_11;
        let host = HeaderValue::from_str(&backend.address).map_err(|e| unavailable(backend, e))?;
        parts.headers.insert(header::HOST, host);

        let response = match time::timeout_at(deadline, self.client.request(Request::from_parts(parts, body))).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(backend = %backend.address, error = %e, "Failed to get response from backend");
                return Err(unavailable(backend, e));
            }
            Err(_) => {
                tracing::error!(backend = %backend.address, timeout = ?self.timeout, "Backend response timed out");
                return Err(unavailable(backend, "timed out"));
            }
        };

        tracing::info!(status = response.status().as_u16(), target = %target, "fwd");

        let (mut parts, body) = response.into_parts();
        if self.trace {
            if let Ok(value) = HeaderValue::from_str(&backend.address) {
                parts.headers.insert(LB_FROM, value);
            }
        }

        let body = relay_until(Body::new(body), deadline, backend.address.clone());
        Ok(Response::from_parts(parts, body))
    }
}

/// Relay `body` frame by frame. A frame still pending at `deadline` ends the
/// stream with a `TimedOut` error so the downstream response is aborted
/// instead of completing short.
fn relay_until(body: Body, deadline: Instant, backend: String) -> Body {
    let frames = body.into_data_stream();
    let stream = stream::unfold(Some(frames), move |frames| {
        let backend = backend.clone();
        async move {
            let Some(mut frames) = frames else { return None };
            match time::timeout_at(deadline, frames.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(frames))),
                Ok(Some(Err(e))) => Some((Err(BoxError::from(e)), None)),
                Ok(None) => None,
                Err(_) => {
                    tracing::error!(backend = %backend, "Backend body relay timed out");
                    let e = io::Error::new(io::ErrorKind::TimedOut, "upstream body exceeded the request deadline");
                    Some((Err(BoxError::from(e)), None))
                }
            }
        }
    });
    Body::from_stream(stream)
}

fn unavailable(backend: &Backend, reason: impl ToString) -> BalancerError {
    BalancerError::UpstreamUnavailable {
        backend: backend.address.clone(),
        reason: reason.to_string(),
    }
}
