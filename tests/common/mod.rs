//! Shared utilities for integration and load testing.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, extract::State, http::StatusCode, routing::{any, get}, Router};
use balancer::{BalancerConfig, HttpServer, Shutdown};
use futures_util::{stream, StreamExt};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A mock backend answering every path with its own name.
pub struct MockBackend {
    pub addr: SocketAddr,
    pub healthy: Arc<AtomicBool>,
}

impl MockBackend {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

/// Start a mock backend whose `/health` follows the returned flag.
pub async fn start_mock_backend(name: &'static str) -> MockBackend {
    let healthy = Arc::new(AtomicBool::new(true));

    let app = Router::new()
        .route(
            "/health",
            get(|State(healthy): State<Arc<AtomicBool>>| async move {
                if healthy.load(Ordering::SeqCst) {
                    StatusCode::OK
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }),
        )
        .route("/", any(move || async move { name }))
        .route("/{*path}", any(move || async move { name }))
        .with_state(healthy.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend { addr, healthy }
}

/// Start a backend that streams `first`, stalls for `pause`, then sends `second`.
pub async fn start_stalling_backend(first: &'static str, pause: Duration, second: &'static str) -> SocketAddr {
    let app = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route(
            "/",
            any(move || async move {
                let chunks = stream::iter([(first, Duration::ZERO), (second, pause)]).then(|(chunk, delay)| async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, std::convert::Infallible>(chunk)
                });
                Body::from_stream(chunks)
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A raw TCP backend that reads one request head and never answers.
pub struct SilentBackend {
    pub addr: SocketAddr,
    /// Fires once the request head has arrived.
    pub received: oneshot::Receiver<()>,
    /// Fires once the balancer side hangs up.
    pub closed: oneshot::Receiver<()>,
}

pub async fn start_silent_backend() -> SilentBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = oneshot::channel();
    let (closed_tx, closed) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let mut head = Vec::new();
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => head.extend_from_slice(&buf[..n]),
            }
        }
        let _ = received_tx.send(());

        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
        let _ = closed_tx.send(());
    });

    SilentBackend { addr, received, closed }
}

/// An address nothing listens on.
pub async fn dead_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Config pointing at `backends` with tracing on and a 1s probe interval.
pub fn config_for(backends: &[SocketAddr]) -> BalancerConfig {
    let mut config = BalancerConfig::default();
    config.backends = backends.iter().map(ToString::to_string).collect();
    config.observability.trace = true;
    config.health_check.interval_secs = 1;
    config.health_check.timeout_secs = 1;
    config
}

/// Start the balancer on an ephemeral port. Returns its address.
pub async fn start_balancer(config: BalancerConfig, shutdown: &Shutdown) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
}
