//! Notifications for off-chain subscribers.
//!
//! Every successful state-changing operation emits exactly one notification.
//! Notifications raised inside an operation are held back until the outermost
//! operation commits; a reverted operation never signals anything.
//! `CapsuleQueried` is the authoritative payment confirmation.

use crate::key::RecordKey;
use crate::types::{Amount, BlockTime, Principal, UniqueId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;

/// Unique notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub UniqueId);

impl EventId {
    /// Fresh random event id.
    pub fn new() -> Self {
        Self(UniqueId::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "evt_{}", self.0)
    }
}

/// What happened. Shared by notifications and history log entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEventType {
    AgentRegistered {
        owner: Principal,
        agent_key: RecordKey,
        agent_id: String,
        name: String,
    },

    CapsuleCreated {
        creator: Principal,
        capsule_key: RecordKey,
        capsule_id: String,
        price: Amount,
    },

    Staked {
        staker: Principal,
        capsule_key: RecordKey,
        capsule_id: String,
        amount: Amount,
        lock_until: BlockTime,
    },

    Unstaked {
        staker: Principal,
        capsule_key: RecordKey,
        capsule_id: String,
        amount: Amount,
    },

    PriceUpdated {
        creator: Principal,
        capsule_key: RecordKey,
        capsule_id: String,
        old_price: Amount,
        new_price: Amount,
    },

    EarningsWithdrawn {
        creator: Principal,
        capsule_key: RecordKey,
        capsule_id: String,
        amount: Amount,
    },

    CapsuleQueried {
        consumer: Principal,
        capsule_key: RecordKey,
        capsule_id: String,
        price: Amount,
    },
}

impl LedgerEventType {
    /// Snake-case variant name, as used by [`EventFilter`].
    pub fn name(&self) -> &'static str {
        match self {
            Self::AgentRegistered { .. } => "agent_registered",
            Self::CapsuleCreated { .. } => "capsule_created",
            Self::Staked { .. } => "staked",
            Self::Unstaked { .. } => "unstaked",
            Self::PriceUpdated { .. } => "price_updated",
            Self::EarningsWithdrawn { .. } => "earnings_withdrawn",
            Self::CapsuleQueried { .. } => "capsule_queried",
        }
    }

    /// Capsule this event concerns, if any.
    pub fn capsule_key(&self) -> Option<RecordKey> {
        match self {
            Self::AgentRegistered { .. } => None,
            Self::CapsuleCreated { capsule_key, .. }
            | Self::Staked { capsule_key, .. }
            | Self::Unstaked { capsule_key, .. }
            | Self::PriceUpdated { capsule_key, .. }
            | Self::EarningsWithdrawn { capsule_key, .. }
            | Self::CapsuleQueried { capsule_key, .. } => Some(*capsule_key),
        }
    }

    /// Whether this belongs in the agent log rather than the capsule log.
    pub fn is_agent_event(&self) -> bool {
        matches!(self, Self::AgentRegistered { .. })
    }
}

/// A published notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub id: EventId,

    /// Global sequence number, shared with the history log.
    pub sequence: u64,

    pub event_type: LedgerEventType,

    /// Block time of the operation.
    pub timestamp: BlockTime,
}

impl LedgerEvent {
    /// Wrap `event_type` with a new id.
    pub fn new(sequence: u64, event_type: LedgerEventType, timestamp: BlockTime) -> Self {
        Self {
            id: EventId::new(),
            sequence,
            event_type,
            timestamp,
        }
    }
}

/// Filter for selecting notifications.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Variant names to accept.
    pub event_types: Option<Vec<String>>,

    /// Only events about this capsule.
    pub capsule_key: Option<RecordKey>,
}

impl EventFilter {
    /// Filter that matches everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only events whose [`LedgerEventType::name`] is `name`.
    pub fn of_type(mut self, name: impl Into<String>) -> Self {
        self.event_types.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// Only events about the capsule under `key`.
    pub fn for_capsule(mut self, key: RecordKey) -> Self {
        self.capsule_key = Some(key);
        self
    }

    /// Check if an event matches this filter.
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        if let Some(types) = &self.event_types {
            if !types.iter().any(|t| t == event.event_type.name()) {
                return false;
            }
        }

        if let Some(key) = &self.capsule_key {
            if event.event_type.capsule_key().as_ref() != Some(key) {
                return false;
            }
        }

        true
    }
}

/// Event receiver (broadcast channel).
pub type EventReceiver = broadcast::Receiver<LedgerEvent>;

/// Event sender (broadcast channel).
pub type EventSender = broadcast::Sender<LedgerEvent>;

/// Publishes committed notifications and keeps a short recent buffer.
pub struct EventManager {
    sender: EventSender,
    recent: VecDeque<LedgerEvent>,
    max_recent: usize,
}

impl EventManager {
    /// Create a manager with the given channel capacity and recent buffer size.
    pub fn new(capacity: usize, max_recent: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            recent: VecDeque::new(),
            max_recent,
        }
    }

    /// Publish an event.
    pub fn emit(&mut self, event: LedgerEvent) {
        self.recent.push_back(event.clone());
        while self.recent.len() > self.max_recent {
            self.recent.pop_front();
        }

        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Most recent events, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LedgerEvent> {
        self.recent.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent matching events, newest first.
    pub fn recent_matching(&self, filter: &EventFilter, limit: usize) -> Vec<LedgerEvent> {
        self.recent
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new(256, 100)
    }
}
