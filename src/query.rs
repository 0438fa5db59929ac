//! Read accessors.
//!
//! Pure lookups with no authorization: nothing stored is secret. Missing keys
//! return default records (`exists == false`) instead of errors.

use crate::history::{Cursor, HistoryEntry, Page};
use crate::key::{derive_key, RecordKey};
use crate::ledger::Ledger;
use crate::records::{Agent, Capsule, EarningsRecord, Stake};
use crate::types::{Amount, Principal};

impl Ledger {
    /// Agent stored under `key`, or a default record.
    pub fn agent_details(&self, key: &RecordKey) -> Agent {
        self.store.agent(key).cloned().unwrap_or_default()
    }

    /// Capsule stored under `key`, or a default record.
    pub fn capsule_details(&self, key: &RecordKey) -> Capsule {
        self.store.capsule(key).cloned().unwrap_or_default()
    }

    /// `staker`'s position on the capsule under `key`.
    pub fn stake_details(&self, key: &RecordKey, staker: &Principal) -> Stake {
        self.store.stake(key, staker).cloned().unwrap_or_default()
    }

    /// Earnings escrow of the capsule under `key`.
    pub fn earnings_details(&self, key: &RecordKey) -> EarningsRecord {
        self.store.earnings(key).cloned().unwrap_or_default()
    }

    /// Agent ids registered by `owner`, in registration order.
    pub fn agents_by_owner(&self, owner: &Principal) -> Vec<String> {
        self.store.agents_by_owner(owner).to_vec()
    }

    /// Full agent records of `owner`, in registration order.
    pub fn agents_by_owner_detailed(&self, owner: &Principal) -> Vec<Agent> {
        self.store
            .agents_by_owner(owner)
            .iter()
            .map(|id| self.agent_details(&derive_key(owner, id)))
            .collect()
    }

    /// Capsule ids created by `owner`, in creation order.
    pub fn capsules_by_owner(&self, owner: &Principal) -> Vec<String> {
        self.store.capsules_by_owner(owner).to_vec()
    }

    /// Full capsule records of `owner`, in creation order.
    pub fn capsules_by_owner_detailed(&self, owner: &Principal) -> Vec<Capsule> {
        self.store
            .capsules_by_owner(owner)
            .iter()
            .map(|id| self.capsule_details(&derive_key(owner, id)))
            .collect()
    }

    /// Total value currently held by the ledger.
    pub fn reserve(&self) -> Amount {
        self.store.reserve()
    }

    /// Σ stake + Σ unwithdrawn earnings over all capsules. Equals
    /// [`reserve`](Self::reserve) after every completed operation.
    ///
    /// `None` if the sum does not fit in an [`Amount`].
    pub fn outstanding_liabilities(&self) -> Option<Amount> {
        self.store.all_capsules().try_fold(Amount::zero(), |acc, c| {
            acc.checked_add(c.total_stake)?.checked_add(c.earnings)
        })
    }

    // ═══════════════════════════════════════════════════════
    // HISTORY
    // ═══════════════════════════════════════════════════════

    /// Every agent history entry, oldest first.
    pub fn all_agent_logs(&self) -> Vec<HistoryEntry> {
        self.store.agent_log().entries().to_vec()
    }

    /// Every capsule history entry, oldest first.
    pub fn all_capsule_logs(&self) -> Vec<HistoryEntry> {
        self.store.capsule_log().entries().to_vec()
    }

    /// One page of the agent log.
    pub fn agent_logs_page(&self, cursor: Cursor) -> Page<HistoryEntry> {
        self.store.agent_log().page(
            cursor,
            self.config.default_page_size,
            self.config.max_page_size,
        )
    }

    /// One page of the capsule log.
    pub fn capsule_logs_page(&self, cursor: Cursor) -> Page<HistoryEntry> {
        self.store.capsule_log().page(
            cursor,
            self.config.default_page_size,
            self.config.max_page_size,
        )
    }

    /// Whether both history logs are intact.
    pub fn verify_history(&self) -> bool {
        self.store.agent_log().verify_chain() && self.store.capsule_log().verify_chain()
    }
}
