//! Client address hashing.
//!
//! # Responsibilities
//! - Derive the selection key from a client's IPv4 address
//! - Ignore any trailing `:port`
//!
//! The four octets are packed little-endian: octet 0 lands in the lowest byte,
//! so `10.0.0.5` becomes `0x0500000A`.

use crate::error::BalancerError;

/// Number of dot-separated components in a dotted-quad address.
const OCTETS: usize = 4;

/// Compute the selection key for a client address (`a.b.c.d` or `a.b.c.d:port`).
///
/// Addresses with fewer or more than four components, non-numeric components,
/// or components above 255 are rejected.
pub fn hash_address(addr: &str) -> Result<u32, BalancerError> {
    let host = match addr.split_once(':') {
        Some((host, _port)) => host,
        None => addr,
    };

    let invalid = || BalancerError::InvalidAddress(addr.to_string());

    let octets: Vec<&str> = host.split('.').collect();
    if octets.len() != OCTETS {
        return Err(invalid());
    }

    let mut sum: u32 = 0;
    for (i, octet) in octets.iter().enumerate() {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: u32 = octet.parse().map_err(|_| invalid())?;
        if n > 255 {
            return Err(invalid());
        }
        sum |= n << (i * 8);
    }

    Ok(sum)
}
