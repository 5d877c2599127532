//! Backend pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered list of backends built at startup
//! - Apply the load balancing strategy to select a backend
//! - Expose backends to the health monitor

use std::collections::HashSet;
use std::sync::Arc;
use crate::error::BalancerError;
use crate::load_balancer::{
    LoadBalancer,
    backend::Backend,
    ip_hash::IpHash,
};

/// The fixed backend pool shared by the frontend and the health monitor.
#[derive(Debug)]
pub struct BackendPool {
    /// Backends in configuration order. Never resized after construction.
    backends: Arc<[Arc<Backend>]>,
    strategy: Box<dyn LoadBalancer>,
}

impl BackendPool {
    /// Build the pool from configured addresses, using `scheme` for all traffic.
    pub fn new(addresses: &[String], scheme: &str) -> Result<Self, url::ParseError> {
        let mut seen = HashSet::new();
        let mut backends = Vec::with_capacity(addresses.len());

        for address in addresses {
            if !seen.insert(address.as_str()) {
                tracing::warn!(address = %address, "Duplicate backend address in pool");
            }
            backends.push(Arc::new(Backend::new(address.clone(), scheme)?));
        }

        Ok(Self::from_backends(backends))
    }

    /// Wrap already-built backends with the default strategy.
    pub fn from_backends(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends: backends.into(),
            strategy: Box::new(IpHash::new()),
        }
    }

    /// Select a healthy backend for the given selection key.
    pub fn select(&self, key: u32) -> Result<Arc<Backend>, BalancerError> {
        match self.strategy.next_server(key, &self.backends) {
            Some(backend) => Ok(backend),
            None => {
                tracing::debug!(backend_count = self.backends.len(), "No healthy backends found in pool");
                for b in self.backends.iter() {
                    tracing::debug!(address = %b.address, healthy = b.is_healthy(), "Backend status");
                }
                Err(BalancerError::NoHealthyBackends)
            }
        }
    }

    /// All backends in pool order (for health checking).
    pub fn all_backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}
