//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend, each on its own task
//! - Overwrite the backend's health flag with the latest result

use std::sync::Arc;
use std::time::Duration;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tokio::task::JoinSet;
use tokio::time::{self, MissedTickBehavior};
use crate::config::HealthCheckConfig;
use crate::http::client::UpstreamClient;
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::{Backend, BackendPool};
use crate::observability::metrics;

const USER_AGENT: &str = "balancer-health-check";

pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    client: UpstreamClient,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, client: UpstreamClient, config: HealthCheckConfig) -> Self {
        Self {
            pool,
            client,
            config,
        }
    }

    /// Probe all backends until `shutdown` fires.
    ///
    /// Dropping the returned future aborts every probe task.
    pub async fn run(self, shutdown: ShutdownSignal) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            path = %self.config.path,
            backends = self.pool.len(),
            "Health monitor starting"
        );

        let mut tasks = JoinSet::new();
        for backend in self.pool.all_backends() {
            tasks.spawn(watch_backend(
                backend.clone(),
                self.client.clone(),
                self.config.clone(),
                shutdown.clone(),
            ));
        }

        while tasks.join_next().await.is_some() {}
        tracing::info!("Health monitor stopped");
    }
}

/// Probe loop for a single backend.
async fn watch_backend(
    backend: Arc<Backend>,
    client: UpstreamClient,
    config: HealthCheckConfig,
    mut shutdown: ShutdownSignal,
) {
    let mut ticker = time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!(address = %backend.address, "Health probe loop exiting");
                break;
            }
            _ = check_on_tick(&mut ticker, &backend, &client, &config) => {}
        }
    }
}

/// Wait for the next tick, probe, and record the result.
async fn check_on_tick(
    ticker: &mut time::Interval,
    backend: &Backend,
    client: &UpstreamClient,
    config: &HealthCheckConfig,
) {
    ticker.tick().await;

    let healthy = probe(client, backend, &config.path, config.timeout()).await;
    let was_healthy = backend.set_healthy(healthy);

    if was_healthy != healthy {
        tracing::info!(address = %backend.address, healthy, "Backend health changed");
    } else {
        tracing::debug!(address = %backend.address, healthy, "Health probe");
    }
    metrics::record_backend_health(&backend.address, healthy);
}

/// Issue one `GET <path>` against `backend`.
///
/// Healthy iff the probe completes within `timeout` with `200 OK`.
pub async fn probe(client: &UpstreamClient, backend: &Backend, path: &str, timeout: Duration) -> bool {
    let url = match backend.url_for(path) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(address = %backend.address, error = %e, "Invalid health check URL");
            return false;
        }
    };

    let request = match Request::builder()
        .method(Method::GET)
        .uri(url.as_str())
        .header(header::USER_AGENT, USER_AGENT)
        .body(Body::empty()) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(address = %backend.address, error = %e, "Failed to build health check request");
                return false;
            }
        };

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let success = response.status() == StatusCode::OK;
            if !success {
                tracing::warn!(address = %backend.address, status = %response.status(), "Health check failed: non-200 status");
            }
            success
        }
        Ok(Err(e)) => {
            tracing::warn!(address = %backend.address, error = %e, "Health check failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(address = %backend.address, "Health check failed: timeout");
            false
        }
    }
}
