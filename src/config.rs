//! Ledger configuration.

use crate::errors::{LedgerError, LedgerResult};
use crate::limits::Limits;
use serde::{Deserialize, Serialize};

/// Configuration for constructing a [`Ledger`](crate::ledger::Ledger).
///
/// All fields have defaults, so a partial JSON document is a valid config:
///
/// ```
/// use anymind_ledger::LedgerConfig;
///
/// let config = LedgerConfig::from_json(r#"{"default_page_size": 20}"#).unwrap();
/// assert_eq!(config.default_page_size, 20);
/// assert_eq!(config.notification_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Price, stake, lock and length bounds.
    pub limits: Limits,

    /// Capacity of the notification broadcast channel.
    pub notification_capacity: usize,

    /// How many published notifications to keep for `recent()`.
    pub recent_notifications: usize,

    /// Page size used when a cursor does not specify one.
    pub default_page_size: usize,

    /// Upper bound on any requested page size.
    pub max_page_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            notification_capacity: 256,
            recent_notifications: 100,
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

impl LedgerConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> LedgerResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| LedgerError::InvalidConfig {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the limits
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set the broadcast capacity
    pub fn notification_capacity(mut self, capacity: usize) -> Self {
        self.notification_capacity = capacity;
        self
    }

    /// Set page sizes
    pub fn page_sizes(mut self, default: usize, max: usize) -> Self {
        self.default_page_size = default;
        self.max_page_size = max;
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> LedgerResult<()> {
        let l = &self.limits;
        let invalid = |message: &str| -> LedgerResult<()> {
            Err(LedgerError::InvalidConfig {
                message: message.to_string(),
            })
        };

        if l.min_price_per_query.is_zero() || l.min_price_per_query > l.max_price_per_query {
            return invalid("price bounds must satisfy 0 < min <= max");
        }
        if l.min_stake_amount.is_zero() || l.min_stake_amount > l.max_stake_amount {
            return invalid("stake bounds must satisfy 0 < min <= max");
        }
        if l.lock_period_seconds <= 0 {
            return invalid("lock period must be positive");
        }
        if l.lock_period().is_none() {
            return invalid("lock period is out of range");
        }
        if l.max_id_length == 0 || l.max_name_length == 0 {
            return invalid("length bounds must be positive");
        }
        if self.notification_capacity == 0 {
            return invalid("notification capacity must be positive");
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return invalid("page sizes must satisfy 0 < default <= max");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Amount;

    #[test]
    fn test_default_config_is_valid() {
        assert!(LedgerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = LedgerConfig::new()
            .notification_capacity(16)
            .page_sizes(10, 100);

        assert_eq!(config.notification_capacity, 16);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_page_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let mut limits = Limits::default();
        limits.min_price_per_query = Amount::new(10);
        limits.max_price_per_query = Amount::new(5);
        let err = LedgerConfig::new().limits(limits).validate().unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");

        let err = LedgerConfig::new().page_sizes(0, 10).validate().unwrap_err();
        assert!(err.to_string().contains("page sizes"));
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            LedgerConfig::from_json(r#"{"limits": {"lock_period_seconds": 60}}"#).unwrap();
        assert_eq!(config.limits.lock_period_seconds, 60);
        assert_eq!(config.limits.max_id_length, 32);
        assert_eq!(config.max_page_size, 500);

        assert!(LedgerConfig::from_json("not json").is_err());
        assert!(LedgerConfig::from_json(r#"{"limits": {"lock_period_seconds": 0}}"#).is_err());
    }

    #[test]
    fn test_rejects_huge_lock_period() {
        let json = format!(r#"{{"limits": {{"lock_period_seconds": {}}}}}"#, i64::MAX);
        let err = LedgerConfig::from_json(&json).unwrap_err();
        assert_eq!(err.code(), "INVALID_CONFIG");
        assert!(err.to_string().contains("lock period"));
    }
}
