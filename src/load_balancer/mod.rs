//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request → peer address
//!     → hash.rs (address → u32 selection key)
//!     → pool.rs (fixed backend list)
//!     → ip_hash.rs (key % healthy count over healthy backends, in order)
//!     → Return backend or NoHealthyBackends
//! ```
//!
//! # Design Decisions
//! - Selection is stateless; the only mutable state is each backend's health flag
//! - Unhealthy backends excluded from selection, never used as a fallback
//! - Pool order is fixed at startup so the healthy subsequence is stable

use std::sync::Arc;

pub mod backend;
pub mod hash;
pub mod ip_hash;
pub mod pool;

pub use backend::Backend;
pub use hash::hash_address;
pub use pool::BackendPool;

/// A backend selection strategy.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick a healthy backend for `key`, or `None` when no backend is healthy.
    fn next_server(&self, key: u32, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}
