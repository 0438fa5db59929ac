//! Earnings payout.
//!
//! The escrow is zeroed before the transfer; a reentrant withdrawal during the
//! payout finds nothing left to withdraw. If the payout fails the zeroing is
//! reverted with the rest of the operation.

use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEventType;
use crate::key::derive_key;
use crate::ledger::Ledger;
use crate::transfer::ValueTransfer;
use crate::types::{Amount, Call};
use tracing::info;

impl Ledger {
    /// Pay the caller all unwithdrawn earnings of their capsule `capsule_id`.
    ///
    /// Returns the amount paid. Fails with `InsufficientPayment` when there is
    /// nothing to withdraw.
    pub fn withdraw_earnings<V>(
        &mut self,
        call: &Call,
        capsule_id: &str,
        rail: &mut V,
    ) -> LedgerResult<Amount>
    where
        V: ValueTransfer + ?Sized,
    {
        self.atomically("withdraw_earnings", |ledger| {
            let key = derive_key(&call.caller, capsule_id);
            let mut record = ledger.store.earnings(&key).cloned().unwrap_or_default();
            let amount = record.total_earnings;
            if amount.is_zero() {
                return Err(LedgerError::InsufficientPayment {
                    provided: 0,
                    required: 1,
                });
            }
            let reserve = ledger.store.reserve();
            if reserve < amount {
                return Err(LedgerError::InsufficientReserve {
                    reserve: reserve.value(),
                    required: amount.value(),
                });
            }

            // Zero both mirrors before paying
            record.total_earnings = Amount::zero();
            ledger.store.put_earnings(key, record);
            if let Some(mut capsule) = ledger.store.capsule(&key).cloned() {
                capsule.earnings = Amount::zero();
                ledger.store.put_capsule(key, capsule);
            }
            ledger.debit_reserve(amount)?;

            ledger.pay_out(rail, &call.caller, amount)?;

            ledger.store.record(
                LedgerEventType::EarningsWithdrawn {
                    creator: call.caller.clone(),
                    capsule_key: key,
                    capsule_id: capsule_id.to_string(),
                    amount,
                },
                call.now,
            );

            info!(creator = %call.caller, capsule_id, amount = %amount, "earnings withdrawn");
            Ok(amount)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NewCapsule;
    use crate::transfer::Wallets;
    use crate::types::Principal;
    use chrono::Utc;

    const PRICE: u128 = 50_000_000_000_000_000;

    fn with_earnings(queries: u32) -> (Ledger, Principal, Wallets) {
        let mut ledger = Ledger::default();
        let mut wallets = Wallets::new();
        let alice = Principal::new("0xA11CE");
        ledger
            .create_capsule(
                &Call::new(alice.clone(), Utc::now()),
                NewCapsule::new("cap1", "Alpha", Amount::new(PRICE)),
            )
            .unwrap();
        for _ in 0..queries {
            ledger
                .query_capsule(
                    &Call::new("0xB0B", Utc::now()).with_value(PRICE),
                    &alice,
                    "cap1",
                    &mut wallets,
                )
                .unwrap();
        }
        (ledger, alice, wallets)
    }

    #[test]
    fn test_withdraw_pays_and_zeroes() {
        let (mut ledger, alice, mut wallets) = with_earnings(3);
        let paid = ledger
            .withdraw_earnings(&Call::new(alice.clone(), Utc::now()), "cap1", &mut wallets)
            .unwrap();

        assert_eq!(paid, Amount::new(3 * PRICE));
        assert_eq!(wallets.balance(&alice), Amount::new(3 * PRICE));

        let key = derive_key(&alice, "cap1");
        let record = ledger.store.earnings(&key).unwrap();
        assert_eq!(record.total_earnings, Amount::zero());
        assert_eq!(record.query_count, 3);
        assert_eq!(ledger.store.capsule(&key).unwrap().earnings, Amount::zero());
        assert_eq!(ledger.store.reserve(), Amount::zero());
    }

    #[test]
    fn test_second_withdrawal_fails() {
        let (mut ledger, alice, mut wallets) = with_earnings(1);
        let call = Call::new(alice.clone(), Utc::now());
        ledger
            .withdraw_earnings(&call, "cap1", &mut wallets)
            .unwrap();
        let err = ledger
            .withdraw_earnings(&call, "cap1", &mut wallets)
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PAYMENT");
        assert_eq!(wallets.payouts().len(), 1);
    }

    #[test]
    fn test_refused_withdrawal_keeps_earnings() {
        let (mut ledger, alice, mut wallets) = with_earnings(2);
        wallets.refuse(alice.clone());

        let err = ledger
            .withdraw_earnings(&Call::new(alice.clone(), Utc::now()), "cap1", &mut wallets)
            .unwrap_err();
        assert_eq!(err.code(), "TRANSFER_FAILED");

        let key = derive_key(&alice, "cap1");
        assert_eq!(
            ledger.store.earnings(&key).unwrap().total_earnings,
            Amount::new(2 * PRICE)
        );
        assert_eq!(ledger.store.capsule(&key).unwrap().earnings, Amount::new(2 * PRICE));
        assert_eq!(ledger.store.reserve(), Amount::new(2 * PRICE));
    }

    #[test]
    fn test_non_creator_has_nothing_to_withdraw() {
        let (mut ledger, _alice, mut wallets) = with_earnings(1);
        let err = ledger
            .withdraw_earnings(&Call::new("0xB0B", Utc::now()), "cap1", &mut wallets)
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_PAYMENT");
    }
}
