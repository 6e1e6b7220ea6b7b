//! Resilience defaults resolved from configuration.
//!
//! Every key is optional; missing keys fall back to the defaults below.
//!
//! ```ini
//! [cache]
//! enabled = true
//! ttl_seconds = 300
//! max_entries = 1000
//!
//! [retry]
//! max_attempts = 3
//! base_delay_seconds = 1.0
//! backoff_factor = 2.0
//!
//! [validation]
//! min_rows = 1
//! required_columns = date,close
//! ```

use crate::domain::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::domain::error::TradingSystemError;
use crate::domain::retry::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, RetryPolicy,
};
use crate::domain::validate::ValidationRule;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ResilienceSettings {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub retry: RetryPolicy,
    pub validation: ValidationRule,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: DEFAULT_TTL,
            cache_capacity: DEFAULT_CAPACITY,
            retry: RetryPolicy::default(),
            validation: ValidationRule::new(Vec::<String>::new(), 1),
        }
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> TradingSystemError {
    TradingSystemError::configuration(format!("invalid config value [{section}] {key}: {reason}"))
}

impl ResilienceSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradingSystemError> {
        let ttl = config.get_int("cache", "ttl_seconds", DEFAULT_TTL.as_secs() as i64);
        if ttl < 0 {
            return Err(invalid("cache", "ttl_seconds", "ttl_seconds must be non-negative"));
        }

        let capacity = config.get_int("cache", "max_entries", DEFAULT_CAPACITY as i64);
        if capacity < 1 {
            return Err(invalid("cache", "max_entries", "max_entries must be at least 1"));
        }

        let max_attempts = config.get_int("retry", "max_attempts", DEFAULT_MAX_ATTEMPTS as i64);
        if max_attempts < 1 || max_attempts > u32::MAX as i64 {
            return Err(invalid("retry", "max_attempts", "max_attempts must be at least 1"));
        }

        let base_delay = config.get_double(
            "retry",
            "base_delay_seconds",
            DEFAULT_BASE_DELAY.as_secs_f64(),
        );
        if !base_delay.is_finite() || base_delay < 0.0 {
            return Err(invalid(
                "retry",
                "base_delay_seconds",
                "base_delay_seconds must be non-negative",
            ));
        }

        let backoff = config.get_double("retry", "backoff_factor", DEFAULT_BACKOFF_FACTOR);
        if !backoff.is_finite() || backoff < 1.0 {
            return Err(invalid("retry", "backoff_factor", "backoff_factor must be at least 1"));
        }

        let min_rows = config.get_int("validation", "min_rows", 1);
        if min_rows < 0 {
            return Err(invalid("validation", "min_rows", "min_rows must be non-negative"));
        }

        Ok(Self {
            cache_enabled: config.get_bool("cache", "enabled", true),
            cache_ttl: Duration::from_secs(ttl as u64),
            cache_capacity: capacity as usize,
            retry: RetryPolicy::from_secs(max_attempts as u32, base_delay, backoff)?,
            validation: ValidationRule::new(
                config.get_list("validation", "required_columns"),
                min_rows as usize,
            ),
        })
    }
}
