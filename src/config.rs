//! Binding configuration.
//!
//! Defaults reproduce the classic adapter: a 10 000-slot diagnostic trace per
//! fit and no buffer-length checks before invocation. Both can be overridden
//! programmatically or through the environment (`.env` is honored):
//!
//! - `CPUFIT_DIAGNOSTIC_CAPACITY`: per-fit diagnostic slots
//! - `CPUFIT_STRICT_LENGTHS`: `true`/`false` (also `1`/`0`, `yes`/`no`, `on`/`off`)

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_DIAGNOSTIC_CAPACITY: usize = 10_000;

pub const ENV_DIAGNOSTIC_CAPACITY: &str = "CPUFIT_DIAGNOSTIC_CAPACITY";
pub const ENV_STRICT_LENGTHS: &str = "CPUFIT_STRICT_LENGTHS";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Diagnostic values allocated per fit for `lambda_info`.
    pub diagnostic_capacity: usize,
    /// Check buffer lengths against the declared counts before invoking the
    /// routine, instead of leaving it to the routine to fail.
    pub strict_lengths: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            diagnostic_capacity: DEFAULT_DIAGNOSTIC_CAPACITY,
            strict_lengths: false,
        }
    }
}

impl BindingConfig {
    /// Defaults overlaid with `CPUFIT_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DIAGNOSTIC_CAPACITY) {
            config.diagnostic_capacity = raw.trim().parse().map_err(|_| ConfigError {
                key: ENV_DIAGNOSTIC_CAPACITY,
                value: raw.clone(),
                reason: "expected a non-negative integer",
            })?;
        }
        if let Some(raw) = lookup(ENV_STRICT_LENGTHS) {
            config.strict_lengths = parse_flag(&raw).ok_or_else(|| ConfigError {
                key: ENV_STRICT_LENGTHS,
                value: raw.clone(),
                reason: "expected true/false",
            })?;
        }

        Ok(config)
    }

    pub fn with_diagnostic_capacity(mut self, capacity: usize) -> Self {
        self.diagnostic_capacity = capacity;
        self
    }

    pub fn with_strict_lengths(mut self, strict: bool) -> Self {
        self.strict_lengths = strict;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_classic_adapter() {
        let config = BindingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.diagnostic_capacity, 10_000);
        assert!(!config.strict_lengths);
    }

    #[test]
    fn environment_overrides_are_parsed() {
        let config = BindingConfig::from_lookup(lookup(&[
            (ENV_DIAGNOSTIC_CAPACITY, " 250 "),
            (ENV_STRICT_LENGTHS, "Yes"),
        ]))
        .unwrap();
        assert_eq!(config.diagnostic_capacity, 250);
        assert!(config.strict_lengths);
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = BindingConfig::from_lookup(lookup(&[(ENV_DIAGNOSTIC_CAPACITY, "-3")])).unwrap_err();
        assert_eq!(err.key, ENV_DIAGNOSTIC_CAPACITY);

        let err = BindingConfig::from_lookup(lookup(&[(ENV_STRICT_LENGTHS, "maybe")])).unwrap_err();
        assert_eq!(err.key, ENV_STRICT_LENGTHS);
    }
}
