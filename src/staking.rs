//! Self-stake deposits and time-locked withdrawals.
//!
//! Only a capsule's creator may stake on it. Every deposit, first or top-up,
//! restarts the lock for a full lock period from the deposit time. Unstaking
//! is allowed once the lock has expired and pays out after the books are
//! updated.

use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEventType;
use crate::key::derive_key;
use crate::ledger::Ledger;
use crate::records::{Stake, StakeState};
use crate::transfer::ValueTransfer;
use crate::types::{Amount, BlockTime, Call, Principal};
use tracing::info;

impl Ledger {
    /// Deposit `call.value` as stake on the capsule `(creator, capsule_id)`.
    ///
    /// Returns the new lock expiry.
    pub fn stake(
        &mut self,
        call: &Call,
        creator: &Principal,
        capsule_id: &str,
    ) -> LedgerResult<BlockTime> {
        self.atomically("stake", |ledger| {
            let amount = call.value;
            let limits = ledger.limits();
            if amount < limits.min_stake_amount {
                return Err(LedgerError::InsufficientPayment {
                    provided: amount.value(),
                    required: limits.min_stake_amount.value(),
                });
            }
            if amount > limits.max_stake_amount {
                return Err(LedgerError::StakeTooHigh {
                    amount: amount.value(),
                    max: limits.max_stake_amount.value(),
                });
            }
            let lock_period = limits
                .lock_period()
                .ok_or_else(|| LedgerError::overflow("lock_period"))?;

            let key = derive_key(creator, capsule_id);
            let mut capsule = ledger
                .store
                .capsule(&key)
                .cloned()
                .ok_or_else(|| LedgerError::CapsuleNotFound {
                    key: key.to_string(),
                })?;
            if capsule.creator != call.caller {
                return Err(LedgerError::Unauthorized {
                    caller: call.caller.to_string(),
                    action: "stake on a capsule it did not create".into(),
                });
            }

            capsule.total_stake = capsule
                .total_stake
                .checked_add(amount)
                .ok_or_else(|| LedgerError::overflow("total_stake"))?;
            capsule.touch(call.now);

            let mut stake = ledger
                .store
                .stake(&key, &call.caller)
                .cloned()
                .unwrap_or_default();
            if !stake.exists {
                stake = Stake {
                    first_staked_at: call.now,
                    exists: true,
                    ..Stake::default()
                };
            }
            stake.staked_at = call.now;
            stake.lock_until = call
                .now
                .checked_add_signed(lock_period)
                .ok_or_else(|| LedgerError::overflow("lock_until"))?;
            let lock_until = stake.lock_until;

            ledger.credit_reserve(amount)?;
            ledger.store.put_capsule(key, capsule);
            ledger.store.put_stake(key, call.caller.clone(), stake);
            ledger.store.record(
                LedgerEventType::Staked {
                    staker: call.caller.clone(),
                    capsule_key: key,
                    capsule_id: capsule_id.to_string(),
                    amount,
                    lock_until,
                },
                call.now,
            );

            info!(staker = %call.caller, capsule_id, amount = %amount, lock_until = %lock_until, "stake deposited");
            Ok(lock_until)
        })
    }

    /// Withdraw `amount` of the caller's stake on their capsule `capsule_id`.
    pub fn unstake<V>(
        &mut self,
        call: &Call,
        capsule_id: &str,
        amount: Amount,
        rail: &mut V,
    ) -> LedgerResult<()>
    where
        V: ValueTransfer + ?Sized,
    {
        self.atomically("unstake", |ledger| {
            if amount.is_zero() {
                return Err(LedgerError::InsufficientPayment {
                    provided: 0,
                    required: 1,
                });
            }

            let key = derive_key(&call.caller, capsule_id);
            let mut capsule = ledger
                .store
                .capsule(&key)
                .cloned()
                .ok_or_else(|| LedgerError::CapsuleNotFound {
                    key: key.to_string(),
                })?;
            let stake = ledger
                .store
                .stake(&key, &call.caller)
                .filter(|s| s.exists)
                .cloned()
                .ok_or(LedgerError::InsufficientStake {
                    available: 0,
                    requested: amount.value(),
                })?;
            let remaining = capsule.total_stake.checked_sub(amount).ok_or(
                LedgerError::InsufficientStake {
                    available: capsule.total_stake.value(),
                    requested: amount.value(),
                },
            )?;
            if call.now < stake.lock_until {
                return Err(LedgerError::StakeLocked {
                    lock_until: stake.lock_until.to_rfc3339(),
                });
            }

            // Effects before the payout
            capsule.total_stake = remaining;
            capsule.touch(call.now);
            ledger.store.put_capsule(key, capsule);
            ledger.debit_reserve(amount)?;

            ledger.pay_out(rail, &call.caller, amount)?;

            ledger.store.record(
                LedgerEventType::Unstaked {
                    staker: call.caller.clone(),
                    capsule_key: key,
                    capsule_id: capsule_id.to_string(),
                    amount,
                },
                call.now,
            );

            info!(staker = %call.caller, capsule_id, amount = %amount, remaining = %remaining, "stake withdrawn");
            Ok(())
        })
    }

    /// Lock state of `staker`'s position on `(creator, capsule_id)` at `now`.
    pub fn stake_state(
        &self,
        creator: &Principal,
        capsule_id: &str,
        staker: &Principal,
        now: BlockTime,
    ) -> StakeState {
        let key = derive_key(creator, capsule_id);
        self.store
            .stake(&key, staker)
            .map(|s| s.state_at(now))
            .unwrap_or(StakeState::Unstaked)
    }
}
