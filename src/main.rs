//! Sticky-by-IP HTTP load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      BALANCER                         │
//!   Client        │  ┌─────────┐   ┌──────────────┐   ┌──────────────┐    │
//!   ──────────────┼─▶│  http   │──▶│ hash(peer ip)│──▶│ pool.select  │    │
//!                 │  │ server  │   └──────────────┘   └──────┬───────┘    │
//!                 │  └─────────┘                             ▼            │
//!   ◀─────────────┼──────────────────────────────────── ┌──────────┐      │   Backend
//!                 │                                     │ forward  │◀─────┼──────────
//!                 │                                     └──────────┘      │
//!                 │  ┌──────────────────────────────┐                     │
//!                 │  │ health monitor (task/backend)│── GET /health ──────┼─────────▶
//!                 │  └──────────────────────────────┘                     │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tokio::net::TcpListener;

use balancer::config::{load_config, BalancerConfig};
use balancer::observability::{logging, metrics};
use balancer::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "balancer")]
#[command(about = "Sticky-by-IP HTTP load balancer", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Load balancer port.
    #[arg(long)]
    port: Option<u16>,

    /// Request timeout in seconds.
    #[arg(long = "timeout-sec")]
    timeout_sec: Option<u64>,

    /// Reach backends over HTTPS (`--https` or `--https=false`).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", action = ArgAction::Set)]
    https: Option<bool>,

    /// Include the lb-from header in responses (`--trace` or `--trace=false`).
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true", action = ArgAction::Set)]
    trace: Option<bool>,

    /// Backend address (repeatable); replaces the configured pool.
    #[arg(long = "backend")]
    backends: Vec<String>,
}

impl Cli {
    fn apply(&self, config: &mut BalancerConfig) {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(secs) = self.timeout_sec {
            config.timeouts.request_secs = secs;
        }
        if let Some(https) = self.https {
            config.upstream.https = https;
        }
        if let Some(trace) = self.trace {
            config.observability.trace = trace;
        }
        if !self.backends.is_empty() {
            config.backends = self.backends.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BalancerConfig::default(),
    };
    cli.apply(&mut config);
    balancer::config::validate_config(&config).map_err(balancer::config::ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("Starting load balancer...");
    tracing::info!(
        port = config.listener.port,
        backends = ?config.backends,
        scheme = config.upstream.scheme(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    tracing::info!("Tracing support enabled: {}", config.observability.trace);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(shutdown.clone().trigger_on_signal());

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
