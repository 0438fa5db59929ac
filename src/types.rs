//! Shared value types used across the ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Executor-supplied block timestamp.
pub type BlockTime = DateTime<Utc>;

/// The authenticated identity performing an operation (e.g. a wallet address).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(pub String);

impl Principal {
    /// Wrap an address or account id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id's UTF-8 bytes, as hashed into record keys.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Amount of currency in its smallest unit.
///
/// One whole unit is `10^18`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(pub u128);

impl Amount {
    /// Smallest units per whole unit.
    pub const UNIT: u128 = 1_000_000_000_000_000_000;

    /// Amount of `value` smallest units.
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// No value.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Whether this is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Sum, or `None` on overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    /// Difference, or `None` if `other` is larger.
    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// Raw value in smallest units.
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

/// Per-operation envelope handed over by the transaction executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Who is calling.
    pub caller: Principal,

    /// Value attached to the call.
    #[serde(default)]
    pub value: Amount,

    /// Block timestamp of the executing operation.
    pub now: BlockTime,
}

impl Call {
    /// Call from `caller` at `now` with no value attached.
    pub fn new(caller: impl Into<Principal>, now: BlockTime) -> Self {
        Self {
            caller: caller.into(),
            value: Amount::zero(),
            now,
        }
    }

    /// Attach value to the call.
    pub fn with_value(mut self, value: impl Into<Amount>) -> Self {
        self.value = value.into();
        self
    }
}

/// Unique identifier (UUID-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueId(pub Uuid);

impl UniqueId {
    /// Random v4 id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
