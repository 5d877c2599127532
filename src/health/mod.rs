//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     One periodic timer per backend
//!     → GET <scheme>://<backend>/health with a bounded timeout
//!     → 200 = healthy, anything else = unhealthy
//!     → Overwrite the backend's atomic health flag
//! ```
//!
//! # Design Decisions
//! - Each tick is memoryless: no thresholds, backoff or flap suppression
//! - Health state is per-backend, never guarded by a pool-wide lock
//! - A slow backend only delays its own probe loop

pub mod active;

pub use active::HealthMonitor;
