//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts and intervals > 0)
//! - Check that every backend address is a usable `host:port` authority
//!
//! Returns all validation errors, not just the first.

use axum::http::uri::Authority;
use thiserror::Error;
use crate::config::schema::BalancerConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend pool is empty")]
    NoBackends,

    #[error("backend address {0:?} is not a valid host:port")]
    InvalidBackend(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health check path {0:?} must start with '/'")]
    InvalidHealthPath(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    for address in &config.backends {
        let valid = !address.trim().is_empty()
            && !address.contains('@')
            && address
                .parse::<Authority>()
                .map(|a| a.as_str() == address.as_str() && a.port_u16().is_some())
                .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidBackend(address.clone()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration("timeouts.request_secs"));
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroDuration("health_check.interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroDuration("health_check.timeout_secs"));
        }
        if !config.health_check.path.starts_with('/') {
            errors.push(ValidationError::InvalidHealthPath(config.health_check.path.clone()));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&BalancerConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_all_errors() {
        let mut config = BalancerConfig::default();
        config.backends = vec!["".into(), "no-port".into(), "user@host:80".into(), "ok:80".into()];
        config.timeouts.request_secs = 0;
        config.health_check.interval_secs = 0;
        config.health_check.path = "health".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBackend("".into()),
                ValidationError::InvalidBackend("no-port".into()),
                ValidationError::InvalidBackend("user@host:80".into()),
                ValidationError::ZeroDuration("timeouts.request_secs"),
                ValidationError::ZeroDuration("health_check.interval_secs"),
                ValidationError::InvalidHealthPath("health".into()),
            ]
        );
    }

    #[test]
    fn test_empty_pool_rejected() {
        let mut config = BalancerConfig::default();
        config.backends.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoBackends]));
    }

    #[test]
    fn test_disabled_health_check_skips_its_checks() {
        let mut config = BalancerConfig::default();
        config.health_check.enabled = false;
        config.health_check.interval_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
