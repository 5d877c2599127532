//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router that sends every path to the proxy handler
//! - Wire up middleware (request tracing)
//! - Start the health monitor alongside the listener
//! - Hash the caller, select a backend, and forward

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::BalancerConfig;
use crate::health::HealthMonitor;
use crate::http::client::{build_client, UpstreamClient};
use crate::http::forward::Forwarder;
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::{hash_address, BackendPool};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<BackendPool>,
    pub forwarder: Forwarder,
    pub trace: bool,
}

/// HTTP frontend of the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<BackendPool>,
    client: UpstreamClient,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: BalancerConfig) -> Result<Self, url::ParseError> {
        let pool = Arc::new(BackendPool::new(&config.backends, config.upstream.scheme())?);
        let client = build_client(&config.upstream);

        let state = AppState {
            pool: pool.clone(),
            forwarder: Forwarder::new(client.clone(), &config),
            trace: config.observability.trace,
        };

        Ok(Self {
            router: Self::build_router(state),
            config,
            pool,
            client,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
    }

    /// The backend pool served by this server.
    pub fn pool(&self) -> Arc<BackendPool> {
        self.pool.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            trace = self.config.observability.trace,
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(self.pool.clone(), self.client.clone(), self.config.health_check.clone());
        let monitor = tokio::spawn(monitor.run(shutdown.clone()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown = shutdown;
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        monitor.abort();
        tracing::info!("HTTP server stopped");
        result
    }
}

/// Main proxy handler.
/// Hashes the caller's address, selects a backend, and forwards the request.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let client_addr = peer.to_string();

    let key = match hash_address(&client_addr) {
        Ok(key) => key,
        Err(e) => {
            tracing::warn!(client = %client_addr, error = %e, "Cannot hash client address, using key 0");
            0
        }
    };

    if state.trace {
        tracing::info!(client = %client_addr, key, "Client's IP hashed");
    }

    let backend = match state.pool.select(key) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::warn!(client = %client_addr, "return 503, no servers available");
            metrics::record_request(e.status().as_u16(), "none", start_time);
            return e.into_response();
        }
    };

    match state.forwarder.forward(&backend, request).await {
        Ok(response) => {
            metrics::record_request(response.status().as_u16(), &backend.address, start_time);
            response
        }
        Err(e) => {
            metrics::record_request(e.status().as_u16(), &backend.address, start_time);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    fn request_from(peer: &str, uri: &str) -> Request<Body> {
        let mut request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let peer: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        request
    }

    async fn serve(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn server_for(backends: Vec<String>) -> HttpServer {
        let mut config = BalancerConfig::default();
        config.backends = backends;
        config.observability.trace = true;
        config.health_check.enabled = false;
        HttpServer::new(config).unwrap()
    }

    #[test]
    fn test_builds_from_default_config() {
        let server = HttpServer::new(BalancerConfig::default()).unwrap();
        assert_eq!(server.pool().len(), 3);
        assert!(server.config().upstream.tls_verify);
    }

    #[test]
    fn test_builds_for_https_without_verification() {
        let mut config = BalancerConfig::default();
        config.upstream.https = true;
        config.upstream.tls_verify = false;
        let server = HttpServer::new(config).unwrap();
        assert_eq!(server.pool().all_backends()[0].base_url.scheme(), "https");
    }

    #[tokio::test]
    async fn test_run_returns_when_shutdown_already_fired() {
        let mut config = BalancerConfig::default();
        config.backends = vec!["127.0.0.1:1".into()];
        let server = HttpServer::new(config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let shutdown = crate::Shutdown::new();
        let signal = shutdown.subscribe();
        shutdown.trigger();

        let result = tokio::time::timeout(std::time::Duration::from_secs(2), server.run(listener, signal))
            .await
            .expect("server kept running after shutdown");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_all_unhealthy_returns_503() {
        let server = server_for(vec!["127.0.0.1:1".into(), "127.0.0.1:2".into()]);
        for b in server.pool().all_backends() {
            b.set_healthy(false);
        }

        let response = server.router.clone().oneshot(request_from("10.0.0.5:4000", "/any")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_routes_by_client_key() {
        let a = serve(Router::new().route("/", get(|| async { "a" }))).await;
        let b = serve(Router::new().route("/", get(|| async { "b" }))).await;
        let server = server_for(vec![a.to_string(), b.to_string()]);

        // The lowest octet decides parity, and with two backends parity decides the index.
        let even = server.router.clone().oneshot(request_from("10.0.0.4:1", "/")).await.unwrap();
        assert_eq!(even.headers()["lb-from"], a.to_string().as_str());

        let odd = server.router.clone().oneshot(request_from("11.0.0.4:1", "/")).await.unwrap();
        assert_eq!(odd.headers()["lb-from"], b.to_string().as_str());
    }

    #[tokio::test]
    async fn test_non_ipv4_client_falls_back_to_key_zero() {
        let a = serve(Router::new().route("/", get(|| async { "a" }))).await;
        let b = serve(Router::new().route("/", get(|| async { "b" }))).await;
        let server = server_for(vec![a.to_string(), b.to_string()]);

        let response = server.router.clone().oneshot(request_from("[::1]:5000", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["lb-from"], a.to_string().as_str());
    }

    #[tokio::test]
    async fn test_unreachable_backend_returns_503() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = listener.local_addr().unwrap();
        drop(listener);

        let server = server_for(vec![dead.to_string()]);
        let response = server.router.clone().oneshot(request_from("10.0.0.5:4000", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("lb-from").is_none());
    }
}
