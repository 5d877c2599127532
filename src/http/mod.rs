//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (peer address captured)
//!     → server.rs (Axum setup, hash + select)
//!     → forward.rs (rewrite, send upstream, stream response back)
//!     → client.rs (pooled HTTP/HTTPS client shared with health probes)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod server;

pub use forward::{Forwarder, LB_FROM};
pub use server::HttpServer;
