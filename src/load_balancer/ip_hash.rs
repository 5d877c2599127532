//! Client-IP hash selection strategy.

use std::sync::Arc;
use crate::load_balancer::{LoadBalancer, backend::Backend};

/// Picks `healthy[key % healthy.len()]` over the healthy backends in pool order.
///
/// Stateless: the same key against the same health snapshot always yields the
/// same backend. Any health transition changes the modulus, so the mapping for
/// every key may move.
#[derive(Debug, Default)]
pub struct IpHash;

impl IpHash {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for IpHash {
    fn next_server(&self, key: u32, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let healthy: Vec<&Arc<Backend>> = backends.iter().filter(|b| b.is_healthy()).collect();
        if healthy.is_empty() {
            return None;
        }

        let index = key as usize % healthy.len();
        Some(healthy[index].clone())
    }
}
