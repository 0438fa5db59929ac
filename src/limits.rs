//! Numeric limits every caller must respect.

use crate::types::Amount;
use serde::{Deserialize, Serialize};

/// Lowest accepted price per query (0.0001 unit).
pub const MIN_PRICE_PER_QUERY: Amount = Amount::new(100_000_000_000_000);

/// Highest accepted price per query (1 unit).
pub const MAX_PRICE_PER_QUERY: Amount = Amount::new(1_000_000_000_000_000_000);

/// Smallest accepted stake deposit (0.01 unit).
pub const MIN_STAKE_AMOUNT: Amount = Amount::new(10_000_000_000_000_000);

/// Largest accepted stake deposit (1000 units).
pub const MAX_STAKE_AMOUNT: Amount = Amount::new(1_000_000_000_000_000_000_000);

/// Seconds a deposit stays locked (7 days).
pub const LOCK_PERIOD_SECONDS: i64 = 604_800;

/// Min bytes for required strings.
pub const MIN_STRING_LENGTH: usize = 1;

/// Max bytes for an agent or capsule id.
pub const MAX_ID_LENGTH: usize = 32;

/// Max bytes for a display name.
pub const MAX_NAME_LENGTH: usize = 128;

/// Reputation in basis points given to new agents (100%).
pub const DEFAULT_REPUTATION: u32 = 10_000;

/// The set of bounds a ledger enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub min_price_per_query: Amount,
    pub max_price_per_query: Amount,
    pub min_stake_amount: Amount,
    pub max_stake_amount: Amount,
    pub lock_period_seconds: i64,
    pub max_id_length: usize,
    pub max_name_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_price_per_query: MIN_PRICE_PER_QUERY,
            max_price_per_query: MAX_PRICE_PER_QUERY,
            min_stake_amount: MIN_STAKE_AMOUNT,
            max_stake_amount: MAX_STAKE_AMOUNT,
            lock_period_seconds: LOCK_PERIOD_SECONDS,
            max_id_length: MAX_ID_LENGTH,
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}

impl Limits {
    /// The lock period as a duration, `None` if chrono cannot represent it.
    pub fn lock_period(&self) -> Option<chrono::Duration> {
        chrono::Duration::try_seconds(self.lock_period_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_match_constants() {
        let limits = Limits::default();
        assert_eq!(limits.min_price_per_query, MIN_PRICE_PER_QUERY);
        assert_eq!(limits.max_price_per_query, MAX_PRICE_PER_QUERY);
        assert_eq!(limits.lock_period().map(|d| d.num_seconds()), Some(604_800));
        assert_eq!(limits.max_id_length, 32);
        assert_eq!(limits.max_name_length, 128);
    }

    #[test]
    fn test_price_bounds_in_units() {
        assert_eq!(MIN_PRICE_PER_QUERY.value() * 10_000, Amount::UNIT);
        assert_eq!(MAX_PRICE_PER_QUERY.value(), Amount::UNIT);
    }

    #[test]
    fn test_unrepresentable_lock_period() {
        let limits = Limits {
            lock_period_seconds: i64::MAX,
            ..Limits::default()
        };
        assert!(limits.lock_period().is_none());
    }
}
