//! Paid queries.
//!
//! A consumer pays at least the capsule's price; exactly the price is
//! credited to the capsule's earnings escrow and any overpayment is refunded
//! in full. The resulting `CapsuleQueried` notification is what the serving
//! side waits for before answering.

use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEventType;
use crate::key::{derive_key, RecordKey};
use crate::ledger::Ledger;
use crate::transfer::ValueTransfer;
use crate::types::{Amount, Call, Principal};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of a settled query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryReceipt {
    pub capsule_key: RecordKey,

    /// Amount credited to the creator's earnings.
    pub price: Amount,

    /// Overpayment returned to the consumer.
    pub refund: Amount,

    /// Queries settled against this capsule since it was listed.
    pub query_count: u64,
}

impl Ledger {
    /// Pay for one query of `(creator, capsule_id)` with `call.value`.
    pub fn query_capsule<V>(
        &mut self,
        call: &Call,
        creator: &Principal,
        capsule_id: &str,
        rail: &mut V,
    ) -> LedgerResult<QueryReceipt>
    where
        V: ValueTransfer + ?Sized,
    {
        self.atomically("query_capsule", |ledger| {
            let key = derive_key(creator, capsule_id);
            let mut capsule = ledger
                .store
                .capsule(&key)
                .cloned()
                .ok_or_else(|| LedgerError::CapsuleNotFound {
                    key: key.to_string(),
                })?;
            let price = capsule.price;
            let refund = call
                .value
                .checked_sub(price)
                .ok_or(LedgerError::InsufficientPayment {
                    provided: call.value.value(),
                    required: price.value(),
                })?;

            let mut record = ledger.store.earnings(&key).cloned().unwrap_or_default();
            record.total_earnings = record
                .total_earnings
                .checked_add(price)
                .ok_or_else(|| LedgerError::overflow("total_earnings"))?;
            record.query_count += 1;
            record.last_updated = call.now;
            capsule.earnings = capsule
                .earnings
                .checked_add(price)
                .ok_or_else(|| LedgerError::overflow("earnings"))?;
            let query_count = record.query_count;

            ledger.credit_reserve(call.value)?;
            ledger.store.put_earnings(key, record);
            ledger.store.put_capsule(key, capsule);

            if !refund.is_zero() {
                ledger.debit_reserve(refund)?;
                ledger.pay_out(rail, &call.caller, refund)?;
            }

            ledger.store.record(
                LedgerEventType::CapsuleQueried {
                    consumer: call.caller.clone(),
                    capsule_key: key,
                    capsule_id: capsule_id.to_string(),
                    price,
                },
                call.now,
            );

            info!(consumer = %call.caller, capsule_id, price = %price, refund = %refund, "query settled");
            Ok(QueryReceipt {
                capsule_key: key,
                price,
                refund,
                query_count,
            })
        })
    }
}
