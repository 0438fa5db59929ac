//! The value-transfer primitive.
//!
//! Paying out is the only way value leaves the ledger. A transfer may fail,
//! and it may run foreign code that calls straight back into the ledger. The
//! ledger therefore hands itself to the primitive and only transfers after
//! every internal write of the current operation is done.

use crate::ledger::Ledger;
use crate::types::{Amount, Principal};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// A transfer was rejected by the recipient or the payment rail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct TransferRefused {
    pub reason: String,
}

impl TransferRefused {
    /// Refusal with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Moves value out of the ledger to a principal.
pub trait ValueTransfer {
    /// Pay `amount` to `to`.
    ///
    /// `ledger` is the ledger issuing the payout; implementations may call
    /// back into it (the call observes the already-updated state). Nested
    /// calls cannot pay out themselves: any payout they attempt fails with
    /// `TransferFailed`.
    fn transfer(
        &mut self,
        ledger: &mut Ledger,
        to: &Principal,
        amount: Amount,
    ) -> Result<(), TransferRefused>;
}

/// A completed payout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub to: Principal,
    pub amount: Amount,
}

/// In-memory wallet balances.
///
/// Credits every payout to the recipient's balance, unless the recipient has
/// been set to refuse funds.
#[derive(Debug, Clone, Default)]
pub struct Wallets {
    balances: HashMap<Principal, Amount>,
    refusing: HashSet<Principal>,
    payouts: Vec<Payout>,
}

impl Wallets {
    /// Empty wallets, accepting from everyone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total received by `principal`.
    pub fn balance(&self, principal: &Principal) -> Amount {
        self.balances.get(principal).copied().unwrap_or_default()
    }

    /// Make `principal` reject incoming funds.
    pub fn refuse(&mut self, principal: impl Into<Principal>) {
        self.refusing.insert(principal.into());
    }

    /// Undo [`refuse`](Self::refuse).
    pub fn accept(&mut self, principal: &Principal) {
        self.refusing.remove(principal);
    }

    /// Successful payouts, in order.
    pub fn payouts(&self) -> &[Payout] {
        &self.payouts
    }
}

impl ValueTransfer for Wallets {
    fn transfer(
        &mut self,
        _ledger: &mut Ledger,
        to: &Principal,
        amount: Amount,
    ) -> Result<(), TransferRefused> {
        if self.refusing.contains(to) {
            return Err(TransferRefused::new(format!("{} refuses funds", to)));
        }

        let balance = self.balance(to);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| TransferRefused::new("recipient balance overflow"))?;
        self.balances.insert(to.clone(), updated);
        self.payouts.push(Payout {
            to: to.clone(),
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallets_credit_and_refuse() {
        let mut ledger = Ledger::default();
        let mut wallets = Wallets::new();
        let bob = Principal::new("0xB0B");

        wallets.transfer(&mut ledger, &bob, Amount::new(5)).unwrap();
        wallets.transfer(&mut ledger, &bob, Amount::new(7)).unwrap();
        assert_eq!(wallets.balance(&bob), Amount::new(12));
        assert_eq!(wallets.payouts().len(), 2);

        wallets.refuse(bob.clone());
        let err = wallets
            .transfer(&mut ledger, &bob, Amount::new(1))
            .unwrap_err();
        assert!(err.reason.contains("refuses"));
        assert_eq!(wallets.balance(&bob), Amount::new(12));

        wallets.accept(&bob);
        assert!(wallets.transfer(&mut ledger, &bob, Amount::new(1)).is_ok());
    }
}
