//! Stored records: agents, capsules, stakes and earnings escrow.
//!
//! Lookups of missing keys yield `Default` records with `exists == false`.

use crate::limits::DEFAULT_REPUTATION;
use crate::types::{Amount, BlockTime, Principal};
use serde::{Deserialize, Serialize};

/// An AI-agent identity owned by a principal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Agent {
    pub owner: Principal,
    pub agent_id: String,
    pub name: String,
    pub display_name: String,
    pub platform: String,
    pub created_at: BlockTime,

    /// Basis points, 10000 = 100%. Reserved for future adjustment.
    pub reputation: u32,

    pub exists: bool,
}

impl Agent {
    pub(crate) fn new(
        owner: Principal,
        agent_id: String,
        name: String,
        display_name: String,
        platform: String,
        now: BlockTime,
    ) -> Self {
        Self {
            owner,
            agent_id,
            name,
            display_name,
            platform,
            created_at: now,
            reputation: DEFAULT_REPUTATION,
            exists: true,
        }
    }
}

/// A priced, stakeable, queryable memory capsule listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capsule {
    pub creator: Principal,
    pub capsule_id: String,
    pub name: String,
    pub description: String,
    pub category: String,

    /// Price per query in the smallest unit.
    pub price: Amount,

    /// Collateral deposited by the creator.
    pub total_stake: Amount,

    /// Unwithdrawn query revenue, mirrors [`EarningsRecord::total_earnings`].
    pub earnings: Amount,

    pub created_at: BlockTime,
    pub updated_at: BlockTime,
    pub exists: bool,
}

impl Capsule {
    /// Advance `updated_at` without ever moving it backwards.
    pub(crate) fn touch(&mut self, now: BlockTime) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }

    /// Whether the capsule currently carries any stake.
    pub fn is_staked(&self) -> bool {
        !self.total_stake.is_zero()
    }
}

/// One principal's staking position on one capsule.
///
/// The staked amount lives on [`Capsule::total_stake`]; only the creator may
/// stake, so there is a single position per capsule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stake {
    /// Time of the most recent deposit.
    pub staked_at: BlockTime,

    /// Time of the first deposit.
    pub first_staked_at: BlockTime,

    /// `staked_at` + lock period.
    pub lock_until: BlockTime,

    pub exists: bool,
}

/// Lock state of a staking position at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StakeState {
    /// No stake record.
    Unstaked,

    /// Deposited and still locked.
    Locked { until: BlockTime },

    /// Lock expired; withdrawable.
    Unlockable,
}

impl Stake {
    /// Lock state as seen at `now`.
    pub fn state_at(&self, now: BlockTime) -> StakeState {
        if !self.exists {
            StakeState::Unstaked
        } else if now < self.lock_until {
            StakeState::Locked {
                until: self.lock_until,
            }
        } else {
            StakeState::Unlockable
        }
    }
}

/// Per-capsule escrow of unwithdrawn query revenue.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub total_earnings: Amount,
    pub query_count: u64,
    pub last_updated: BlockTime,
}
