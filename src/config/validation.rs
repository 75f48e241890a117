//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, addresses parse)
//! - Reject an empty command allow-list
//! - Bound the dial retry count
//! - Make sure an HTTP request outlives the worst-case Trans round trip, so
//!   a Trans timeout is reported as such rather than cut off by the HTTP layer
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::config::schema::{BackoffStrategy, GatewayConfig};
use crate::resilience::backoff;
use crate::trans::AllowList;

/// Dial retries beyond this are rejected.
pub const MAX_RETRY_ATTEMPTS: u32 = 100;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be > 0"));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be > 0"));
    }

    let trans = &config.trans;
    if trans.host.trim().is_empty() {
        errors.push(ValidationError::new("trans.host", "must not be empty"));
    }
    if trans.port == 0 {
        errors.push(ValidationError::new("trans.port", "must be > 0"));
    }
    if trans.timeout_secs == 0 {
        errors.push(ValidationError::new("trans.timeout_secs", "must be > 0"));
    }
    if AllowList::parse(&trans.allowed_commands).is_empty() {
        errors.push(ValidationError::new("trans.allowed_commands", "no command allowed"));
    }
    if trans.retry.strategy == BackoffStrategy::Exponential
        && trans.retry.max_interval_secs < trans.retry.interval_secs
    {
        errors.push(ValidationError::new(
            "trans.retry.max_interval_secs",
            "must be >= interval_secs",
        ));
    }
    if trans.retry.attempts > MAX_RETRY_ATTEMPTS {
        errors.push(ValidationError::new(
            "trans.retry.attempts",
            format!("must be <= {MAX_RETRY_ATTEMPTS}"),
        ));
    } else if trans.timeout_secs > 0 && config.listener.request_timeout_secs > 0 {
        let budget = backoff::worst_case_duration(trans);
        let request_timeout = Duration::from_secs(config.listener.request_timeout_secs);
        if request_timeout <= budget {
            errors.push(ValidationError::new(
                "listener.request_timeout_secs",
                format!(
                    "must exceed the worst-case trans round trip ({}s: dial attempts, retry waits and exchange)",
                    budget.as_secs_f64().ceil()
                ),
            ));
        }
    }

    let obs = &config.observability;
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", obs.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.trans.port = 0;
        config.trans.timeout_secs = 0;
        config.trans.allowed_commands = " | ".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "trans.port",
                "trans.timeout_secs",
                "trans.allowed_commands"
            ]
        );
    }

    #[test]
    fn retry_attempts_are_capped() {
        let mut config = GatewayConfig::default();
        config.trans.retry.attempts = u32::MAX;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "trans.retry.attempts");

        config.trans.retry.attempts = MAX_RETRY_ATTEMPTS;
        config.trans.retry.interval_secs = 0;
        config.trans.timeout_secs = 1;
        config.listener.request_timeout_secs = 1000;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn request_timeout_must_outlive_trans_round_trip() {
        let mut config = GatewayConfig::default();
        config.listener.request_timeout_secs = 1;
        config.trans.timeout_secs = 3;
        config.trans.retry.attempts = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "listener.request_timeout_secs");
        assert!(errors[0].message.contains("6s"), "{}", errors[0]);

        // Two 3s deadlines (dial + exchange) fit in 7s.
        config.listener.request_timeout_secs = 7;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn exponential_cap_below_base() {
        let mut config = GatewayConfig::default();
        config.trans.retry.strategy = BackoffStrategy::Exponential;
        config.trans.retry.interval_secs = 10;
        config.trans.retry.max_interval_secs = 2;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "trans.retry.max_interval_secs: must be >= interval_secs");
    }
}
