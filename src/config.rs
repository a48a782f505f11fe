//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Worker pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Pool name, used as the prefix of worker names in logs.
    pub name: String,
    /// Number of workers started at construction. Fixed for the pool's lifetime.
    pub worker_count: usize,
    /// How long `shutdown` waits quietly for in-flight tasks before warning
    /// that a worker is still busy. The task is still waited for.
    pub shutdown_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "protopool".to_string(),
            worker_count: 4,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Config with the given worker count and defaults for everything else.
    pub fn with_workers(worker_count: usize) -> Self {
        Self {
            worker_count,
            ..Self::default()
        }
    }

    /// Load from `PROTOPOOL_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let name = lookup("PROTOPOOL_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.name);

        let worker_count = match lookup("PROTOPOOL_WORKERS") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                ConfigError::ParseError(format!("PROTOPOOL_WORKERS={raw:?}: {e}"))
            })?,
            None => defaults.worker_count,
        };

        let shutdown_timeout = match lookup("PROTOPOOL_SHUTDOWN_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse::<u64>().map_err(|e| {
                ConfigError::ParseError(format!("PROTOPOOL_SHUTDOWN_TIMEOUT_SECS={raw:?}: {e}"))
            })?),
            None => defaults.shutdown_timeout,
        };

        let config = Self {
            name,
            worker_count,
            shutdown_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the pool cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "worker_count".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = PoolConfig::default();
        assert_eq!(config.worker_count, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_rejected() {
        let result = PoolConfig::with_workers(0).validate();
        assert!(matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "worker_count"));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = PoolConfig::from_lookup(lookup_from(&[
            ("PROTOPOOL_NAME", "imgpool"),
            ("PROTOPOOL_WORKERS", " 8 "),
            ("PROTOPOOL_SHUTDOWN_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.name, "imgpool");
        assert_eq!(config.worker_count, 8);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }

    #[test]
    fn missing_env_uses_defaults() {
        let config = PoolConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.name, "protopool");
        assert_eq!(config.worker_count, 4);
    }

    #[test]
    fn unparsable_worker_count() {
        let result = PoolConfig::from_lookup(lookup_from(&[("PROTOPOOL_WORKERS", "four")]));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn negative_worker_count_is_a_parse_error() {
        let result = PoolConfig::from_lookup(lookup_from(&[("PROTOPOOL_WORKERS", "-2")]));
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn zero_worker_count_from_env_rejected() {
        let result = PoolConfig::from_lookup(lookup_from(&[("PROTOPOOL_WORKERS", "0")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
