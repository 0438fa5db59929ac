//! Ledger state with checkpoint/rollback.
//!
//! Every write goes through this store and leaves an undo record behind, so
//! any operation (including the nested operations a value transfer may
//! trigger) can be reverted to a checkpoint bit-identically. History logs and
//! queued notifications are append-only and revert by truncation.

use crate::events::{LedgerEvent, LedgerEventType};
use crate::history::HistoryLog;
use crate::key::RecordKey;
use crate::records::{Agent, Capsule, EarningsRecord, Stake};
use crate::types::{Amount, BlockTime, Principal};
use std::collections::HashMap;

/// Prior value of one written slot.
#[derive(Debug)]
enum Undo {
    Agent(RecordKey, Option<Agent>),
    Capsule(RecordKey, Option<Capsule>),
    Stake(RecordKey, Principal, Option<Stake>),
    Earnings(RecordKey, Option<EarningsRecord>),
    AgentOwnerPush(Principal),
    CapsuleOwnerPush(Principal),
    Reserve(Amount),
}

/// Marks a point the store can roll back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Checkpoint {
    undo_len: usize,
    agent_log_len: usize,
    capsule_log_len: usize,
    next_sequence: u64,
    pending_len: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    agents: HashMap<RecordKey, Agent>,
    capsules: HashMap<RecordKey, Capsule>,
    stakes: HashMap<RecordKey, HashMap<Principal, Stake>>,
    earnings: HashMap<RecordKey, EarningsRecord>,
    agents_by_owner: HashMap<Principal, Vec<String>>,
    capsules_by_owner: HashMap<Principal, Vec<String>>,

    /// Total value held by the ledger.
    reserve: Amount,

    agent_log: HistoryLog,
    capsule_log: HistoryLog,
    next_sequence: u64,

    /// Notifications awaiting commit of the outermost operation.
    pending: Vec<LedgerEvent>,

    undo: Vec<Undo>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════
    // READS
    // ═══════════════════════════════════════════════════════

    pub fn agent(&self, key: &RecordKey) -> Option<&Agent> {
        self.agents.get(key)
    }

    pub fn capsule(&self, key: &RecordKey) -> Option<&Capsule> {
        self.capsules.get(key)
    }

    pub fn stake(&self, key: &RecordKey, staker: &Principal) -> Option<&Stake> {
        self.stakes.get(key).and_then(|m| m.get(staker))
    }

    pub fn earnings(&self, key: &RecordKey) -> Option<&EarningsRecord> {
        self.earnings.get(key)
    }

    pub fn agents_by_owner(&self, owner: &Principal) -> &[String] {
        self.agents_by_owner
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn capsules_by_owner(&self, owner: &Principal) -> &[String] {
        self.capsules_by_owner
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn reserve(&self) -> Amount {
        self.reserve
    }

    pub fn agent_log(&self) -> &HistoryLog {
        &self.agent_log
    }

    pub fn capsule_log(&self) -> &HistoryLog {
        &self.capsule_log
    }

    pub fn all_capsules(&self) -> impl Iterator<Item = &Capsule> {
        self.capsules.values()
    }

    // ═══════════════════════════════════════════════════════
    // WRITES
    // ═══════════════════════════════════════════════════════

    pub fn put_agent(&mut self, key: RecordKey, agent: Agent) {
        let prior = self.agents.insert(key, agent);
        self.undo.push(Undo::Agent(key, prior));
    }

    pub fn put_capsule(&mut self, key: RecordKey, capsule: Capsule) {
        let prior = self.capsules.insert(key, capsule);
        self.undo.push(Undo::Capsule(key, prior));
    }

    pub fn put_stake(&mut self, key: RecordKey, staker: Principal, stake: Stake) {
        let prior = self
            .stakes
            .entry(key)
            .or_default()
            .insert(staker.clone(), stake);
        self.undo.push(Undo::Stake(key, staker, prior));
    }

    pub fn put_earnings(&mut self, key: RecordKey, record: EarningsRecord) {
        let prior = self.earnings.insert(key, record);
        self.undo.push(Undo::Earnings(key, prior));
    }

    pub fn push_owned_agent(&mut self, owner: Principal, agent_id: String) {
        self.agents_by_owner
            .entry(owner.clone())
            .or_default()
            .push(agent_id);
        self.undo.push(Undo::AgentOwnerPush(owner));
    }

    pub fn push_owned_capsule(&mut self, owner: Principal, capsule_id: String) {
        self.capsules_by_owner
            .entry(owner.clone())
            .or_default()
            .push(capsule_id);
        self.undo.push(Undo::CapsuleOwnerPush(owner));
    }

    pub fn set_reserve(&mut self, reserve: Amount) {
        let prior = std::mem::replace(&mut self.reserve, reserve);
        self.undo.push(Undo::Reserve(prior));
    }

    /// Append to the matching history log and queue the notification.
    pub fn record(&mut self, event_type: LedgerEventType, now: BlockTime) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        if event_type.is_agent_event() {
            self.agent_log.append(sequence, event_type.clone(), now);
        } else {
            self.capsule_log.append(sequence, event_type.clone(), now);
        }
        self.pending.push(LedgerEvent::new(sequence, event_type, now));
        sequence
    }

    // ═══════════════════════════════════════════════════════
    // TRANSACTIONS
    // ═══════════════════════════════════════════════════════

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            undo_len: self.undo.len(),
            agent_log_len: self.agent_log.len(),
            capsule_log_len: self.capsule_log.len(),
            next_sequence: self.next_sequence,
            pending_len: self.pending.len(),
        }
    }

    /// Revert every write made since `cp`, newest first.
    pub fn rollback(&mut self, cp: Checkpoint) {
        while self.undo.len() > cp.undo_len {
            let Some(undo) = self.undo.pop() else { break };
            match undo {
                Undo::Agent(key, prior) => restore(&mut self.agents, key, prior),
                Undo::Capsule(key, prior) => restore(&mut self.capsules, key, prior),
                Undo::Earnings(key, prior) => restore(&mut self.earnings, key, prior),
                Undo::Stake(key, staker, prior) => {
                    let inner = self.stakes.entry(key).or_default();
                    restore(inner, staker, prior);
                    if inner.is_empty() {
                        self.stakes.remove(&key);
                    }
                }
                Undo::AgentOwnerPush(owner) => pop_owned(&mut self.agents_by_owner, &owner),
                Undo::CapsuleOwnerPush(owner) => pop_owned(&mut self.capsules_by_owner, &owner),
                Undo::Reserve(prior) => self.reserve = prior,
            }
        }
        self.agent_log.truncate(cp.agent_log_len);
        self.capsule_log.truncate(cp.capsule_log_len);
        self.next_sequence = cp.next_sequence;
        self.pending.truncate(cp.pending_len);
    }

    /// Make everything since the outermost checkpoint permanent.
    /// Returns the notifications to publish, in order.
    pub fn commit(&mut self) -> Vec<LedgerEvent> {
        self.undo.clear();
        std::mem::take(&mut self.pending)
    }
}

fn restore<K, V>(map: &mut HashMap<K, V>, key: K, prior: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    match prior {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}

fn pop_owned(lists: &mut HashMap<Principal, Vec<String>>, owner: &Principal) {
    if let Some(list) = lists.get_mut(owner) {
        list.pop();
        if list.is_empty() {
            lists.remove(owner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_key;
    use chrono::Utc;

    fn capsule(price: u128) -> Capsule {
        Capsule {
            creator: Principal::new("0xA11CE"),
            capsule_id: "cap1".into(),
            price: Amount::new(price),
            exists: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_rollback_restores_prior_values() {
        let mut store = Store::new();
        let owner = Principal::new("0xA11CE");
        let key = derive_key(&owner, "cap1");

        store.put_capsule(key, capsule(10));
        store.set_reserve(Amount::new(5));
        store.commit();

        let cp = store.checkpoint();
        store.put_capsule(key, capsule(20));
        store.set_reserve(Amount::new(7));
        store.push_owned_capsule(owner.clone(), "cap2".into());
        store.put_stake(key, owner.clone(), Stake::default());
        store.record(
            LedgerEventType::Unstaked {
                staker: owner.clone(),
                capsule_key: key,
                capsule_id: "cap1".into(),
                amount: Amount::new(1),
            },
            Utc::now(),
        );
        store.rollback(cp);

        assert_eq!(store.capsule(&key).unwrap().price, Amount::new(10));
        assert_eq!(store.reserve(), Amount::new(5));
        assert!(store.capsules_by_owner(&owner).is_empty());
        assert!(store.stake(&key, &owner).is_none());
        assert!(store.capsule_log().is_empty());
        assert!(store.commit().is_empty());
    }

    #[test]
    fn test_nested_rollback_keeps_outer_writes() {
        let mut store = Store::new();
        let owner = Principal::new("0xA11CE");
        let key = derive_key(&owner, "cap1");

        let outer = store.checkpoint();
        store.put_capsule(key, capsule(10));

        let inner = store.checkpoint();
        store.put_capsule(key, capsule(99));
        store.rollback(inner);
        assert_eq!(store.capsule(&key).unwrap().price, Amount::new(10));

        store.rollback(outer);
        assert!(store.capsule(&key).is_none());
    }

    #[test]
    fn test_commit_drains_pending() {
        let mut store = Store::new();
        let owner = Principal::new("0xA11CE");
        let seq = store.record(
            LedgerEventType::AgentRegistered {
                owner: owner.clone(),
                agent_key: derive_key(&owner, "agent1"),
                agent_id: "agent1".into(),
                name: "Agent One".into(),
            },
            Utc::now(),
        );
        assert_eq!(seq, 0);
        assert_eq!(store.agent_log().len(), 1);

        let published = store.commit();
        assert_eq!(published.len(), 1);
        assert!(store.commit().is_empty());
    }
}
