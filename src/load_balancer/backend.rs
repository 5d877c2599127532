//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Hold the pre-computed base URL used for probes and forwards
//! - Track health state (healthy/unhealthy) in an independent atomic cell

use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// The `host:port` address of the backend. Identity of the backend.
    pub address: String,
    /// Pre-calculated base URL (`scheme://address/`).
    pub base_url: Url,
    /// Latest probe result. Written only by the health monitor.
    healthy: AtomicBool,
}

impl Backend {
    /// Create a new backend. Backends start out healthy.
    pub fn new(address: impl Into<String>, scheme: &str) -> Result<Self, url::ParseError> {
        let address = address.into();
        let base_url = Url::parse(&format!("{}://{}", scheme, address))?;
        Ok(Self {
            address,
            base_url,
            healthy: AtomicBool::new(true),
        })
    }

    /// Return true if the last probe found the backend healthy.
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Overwrite the health flag, returning the previous value.
    pub fn set_healthy(&self, healthy: bool) -> bool {
        self.healthy.swap(healthy, Ordering::Relaxed)
    }

    /// URL of `path` on this backend.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}
