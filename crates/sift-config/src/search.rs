//! Search pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_page_size() -> u32 {
    100
}

const fn default_max_page_size() -> u32 {
    500
}

const fn default_lookup_timeout_ms() -> u64 {
    5_000
}

const fn default_max_concurrent_lookups() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    /// Page size used when a request does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Largest page size a request may ask for.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Deadline for each collaborator call (hierarchy, authorization,
    /// baseline, index), in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,

    /// Upper bound on per-project lookups in flight for one request.
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            lookup_timeout_ms: default_lookup_timeout_ms(),
            max_concurrent_lookups: default_max_concurrent_lookups(),
        }
    }
}

impl SearchConfig {
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero sizes, a zero timeout,
    /// zero concurrency, or a default page size above the maximum.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: format!("search.{field}"),
            reason: reason.to_string(),
        };

        if self.default_page_size == 0 {
            return Err(invalid("default_page_size", "must be at least 1"));
        }
        if self.max_page_size == 0 {
            return Err(invalid("max_page_size", "must be at least 1"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(invalid(
                "default_page_size",
                "must not exceed search.max_page_size",
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(invalid("lookup_timeout_ms", "must be at least 1"));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(invalid("max_concurrent_lookups", "must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SearchConfig::default();
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.max_page_size, 500);
        assert_eq!(config.lookup_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_concurrent_lookups, 16);
        config.validate().expect("defaults validate");
    }

    #[test]
    fn default_page_size_above_max_is_rejected() {
        let config = SearchConfig {
            default_page_size: 600,
            ..SearchConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref field, .. } if field == "search.default_page_size"
        ));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let config = SearchConfig {
            max_concurrent_lookups: 0,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
