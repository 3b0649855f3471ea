//! Operator configuration from environment variables.

use crate::error::ControllerError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Runtime settings for the operator process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    /// Namespace to watch; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Maximum concurrent reconciliations (distinct DoclingServes)
    pub concurrency: u16,
    /// Quiet period after the last event before reconciling
    pub debounce: Duration,
    /// Error backoff floor in minutes
    pub backoff_min_minutes: u64,
    /// Error backoff ceiling in minutes
    pub backoff_max_minutes: u64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            concurrency: 3,
            debounce: Duration::from_secs(1),
            backoff_min_minutes: 1,
            backoff_max_minutes: 10,
        }
    }
}

impl OperatorConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let defaults = Self::default();
        let config = Self {
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            concurrency: parse_or(&lookup, "RECONCILE_CONCURRENCY", defaults.concurrency)?,
            debounce: Duration::from_secs(parse_or(
                &lookup,
                "RECONCILE_DEBOUNCE_SECS",
                defaults.debounce.as_secs(),
            )?),
            backoff_min_minutes: parse_or(&lookup, "BACKOFF_MIN_MINUTES", defaults.backoff_min_minutes)?,
            backoff_max_minutes: parse_or(&lookup, "BACKOFF_MAX_MINUTES", defaults.backoff_max_minutes)?,
        };

        if config.concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if config.backoff_min_minutes == 0 || config.backoff_min_minutes > config.backoff_max_minutes {
            return Err(ControllerError::InvalidConfig(format!(
                "backoff bounds must satisfy 0 < min <= max, got min={} max={}",
                config.backoff_min_minutes, config.backoff_max_minutes
            )));
        }
        Ok(config)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ControllerError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            ControllerError::InvalidConfig(format!("{} has invalid value {:?}", key, raw))
        }),
    }
}
