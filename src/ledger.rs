//! The ledger: owner of all marketplace state.
//!
//! Operations live in their own modules (`registry`, `staking`,
//! `settlement`, `withdrawal`, `query`) as `impl Ledger` blocks. Each
//! state-changing operation runs inside [`Ledger::atomically`], which either
//! commits all of its writes or none of them.

use crate::config::LedgerConfig;
use crate::errors::{LedgerError, LedgerResult};
use crate::events::{EventFilter, EventManager, EventReceiver, LedgerEvent};
use crate::limits::Limits;
use crate::store::Store;
use crate::transfer::ValueTransfer;
use crate::types::{Amount, Principal};
use tracing::{debug, warn};

/// Marketplace ledger for agents, capsules, stakes and earnings.
pub struct Ledger {
    pub(crate) config: LedgerConfig,
    pub(crate) store: Store,
    events: EventManager,

    /// Number of operations currently on the call stack.
    depth: usize,
}

impl Ledger {
    /// Create a ledger from a validated config.
    pub fn new(config: LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        let events = EventManager::new(config.notification_capacity, config.recent_notifications);
        Ok(Self {
            config,
            store: Store::new(),
            events,
            depth: 0,
        })
    }

    /// Configuration this ledger was built with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Bounds enforced by every operation.
    pub fn limits(&self) -> &Limits {
        &self.config.limits
    }

    /// Subscribe to committed notifications.
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Recently published notifications, newest first.
    pub fn recent_events(&self, limit: usize) -> Vec<LedgerEvent> {
        self.events.recent(limit)
    }

    /// Recently published notifications accepted by `filter`, newest first.
    pub fn recent_events_matching(&self, filter: &EventFilter, limit: usize) -> Vec<LedgerEvent> {
        self.events.recent_matching(filter, limit)
    }

    /// Run `op` as one all-or-nothing operation.
    ///
    /// Nested calls (reentry through a value transfer) get their own
    /// checkpoint; notifications are published only when the outermost
    /// operation succeeds.
    pub(crate) fn atomically<T>(
        &mut self,
        name: &'static str,
        op: impl FnOnce(&mut Self) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let checkpoint = self.store.checkpoint();
        self.depth += 1;
        let result = op(self);
        self.depth -= 1;

        match result {
            Ok(value) => {
                if self.depth == 0 {
                    for event in self.store.commit() {
                        self.events.emit(event);
                    }
                }
                Ok(value)
            }
            Err(err) => {
                self.store.rollback(checkpoint);
                debug!(
                    operation = name,
                    code = err.code(),
                    depth = self.depth,
                    "operation reverted: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Deduct `amount` from the reserve. Must precede the matching payout.
    pub(crate) fn debit_reserve(&mut self, amount: Amount) -> LedgerResult<()> {
        let reserve = self.store.reserve();
        let remaining = reserve
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientReserve {
                reserve: reserve.value(),
                required: amount.value(),
            })?;
        self.store.set_reserve(remaining);
        Ok(())
    }

    pub(crate) fn credit_reserve(&mut self, amount: Amount) -> LedgerResult<()> {
        let reserve = self
            .store
            .reserve()
            .checked_add(amount)
            .ok_or_else(|| LedgerError::overflow("reserve"))?;
        self.store.set_reserve(reserve);
        Ok(())
    }

    /// Hand `amount` to the transfer primitive. All bookkeeping must be done.
    ///
    /// Only the outermost operation may move value out. A payout made by a
    /// reentrant operation could not be taken back if the enclosing
    /// operation later reverts, so it is refused.
    pub(crate) fn pay_out<V>(
        &mut self,
        rail: &mut V,
        to: &Principal,
        amount: Amount,
    ) -> LedgerResult<()>
    where
        V: ValueTransfer + ?Sized,
    {
        if self.depth > 1 {
            warn!(to = %to, amount = %amount, depth = self.depth, "nested payout refused");
            return Err(LedgerError::TransferFailed {
                to: to.to_string(),
                amount: amount.value(),
                reason: "payout from a reentrant operation".into(),
            });
        }

        rail.transfer(self, to, amount).map_err(|refused| {
            warn!(to = %to, amount = %amount, "payout refused: {}", refused);
            LedgerError::TransferFailed {
                to: to.to_string(),
                amount: amount.value(),
                reason: refused.reason,
            }
        })
    }

    /// Validate a non-empty string bounded by `max` bytes.
    pub(crate) fn check_string(field: &str, value: &str, max: usize) -> LedgerResult<()> {
        if value.len() < crate::limits::MIN_STRING_LENGTH {
            return Err(LedgerError::empty(field));
        }
        Self::check_length(field, value, max)
    }

    pub(crate) fn check_length(field: &str, value: &str, max: usize) -> LedgerResult<()> {
        if value.len() > max {
            return Err(LedgerError::too_long(field, value.len(), max));
        }
        Ok(())
    }

    pub(crate) fn check_price(&self, price: Amount) -> LedgerResult<()> {
        let limits = &self.config.limits;
        if price < limits.min_price_per_query {
            return Err(LedgerError::InvalidPrice {
                price: price.value(),
                min: limits.min_price_per_query.value(),
            });
        }
        if price > limits.max_price_per_query {
            return Err(LedgerError::PriceTooHigh {
                price: price.value(),
                max: limits.max_price_per_query.value(),
            });
        }
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        let config = LedgerConfig::default();
        let events = EventManager::new(config.notification_capacity, config.recent_notifications);
        Self {
            config,
            store: Store::new(),
            events,
            depth: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::{MAX_PRICE_PER_QUERY, MIN_PRICE_PER_QUERY};

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LedgerConfig::new().notification_capacity(0);
        assert!(Ledger::new(config).is_err());
        assert!(Ledger::new(LedgerConfig::default()).is_ok());
    }

    #[test]
    fn test_price_bounds() {
        let ledger = Ledger::default();
        assert!(ledger.check_price(MIN_PRICE_PER_QUERY).is_ok());
        assert!(ledger.check_price(MAX_PRICE_PER_QUERY).is_ok());
        assert!(matches!(
            ledger.check_price(Amount::new(MIN_PRICE_PER_QUERY.value() - 1)),
            Err(LedgerError::InvalidPrice { .. })
        ));
        assert!(matches!(
            ledger.check_price(Amount::new(MAX_PRICE_PER_QUERY.value() + 1)),
            Err(LedgerError::PriceTooHigh { .. })
        ));
    }

    #[test]
    fn test_string_checks() {
        assert!(matches!(
            Ledger::check_string("agent_id", "", 32),
            Err(LedgerError::EmptyString { .. })
        ));
        assert!(matches!(
            Ledger::check_string("agent_id", &"a".repeat(33), 32),
            Err(LedgerError::InvalidMetadataLength { len: 33, max: 32, .. })
        ));
        assert!(Ledger::check_string("agent_id", &"a".repeat(32), 32).is_ok());
    }

    #[test]
    fn test_failed_operation_reverts_reserve() {
        let mut ledger = Ledger::default();
        let result: LedgerResult<()> = ledger.atomically("test", |l| {
            l.credit_reserve(Amount::new(10))?;
            l.debit_reserve(Amount::new(11))
        });
        assert!(matches!(result, Err(LedgerError::InsufficientReserve { .. })));
        assert_eq!(ledger.store.reserve(), Amount::zero());
    }

    #[test]
    fn test_only_outermost_operation_pays_out() {
        use crate::transfer::Wallets;

        let mut ledger = Ledger::default();
        let mut wallets = Wallets::new();
        let bob = Principal::new("0xB0B");

        let result: LedgerResult<()> = ledger.atomically("outer", |l| {
            l.pay_out(&mut wallets, &bob, Amount::new(5))?;
            let nested: LedgerResult<()> =
                l.atomically("inner", |l| l.pay_out(&mut wallets, &bob, Amount::new(7)));
            assert!(matches!(nested, Err(LedgerError::TransferFailed { .. })));
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(wallets.balance(&bob), Amount::new(5));
        assert_eq!(wallets.payouts().len(), 1);
    }
}
