//! Deterministic record keys.
//!
//! Agents and capsules are addressed by a key derived from the owning
//! principal and the owner-chosen id. The same pair always maps to the same
//! key; distinct pairs collide only with negligible probability.

use crate::types::Principal;
use serde::{Deserialize, Serialize};

/// 32-byte BLAKE3 key for an (owner, id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RecordKey(#[serde(with = "hex_serde")] pub [u8; 32]);

impl RecordKey {
    /// Parse a key from its hex rendering.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Derive the record key for `id` owned by `owner`.
///
/// The principal is length-prefixed, so `("ab", "c")` and `("a", "bc")`
/// never hash the same input.
pub fn derive_key(owner: &Principal, id: &str) -> RecordKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(owner.as_bytes().len() as u64).to_le_bytes());
    hasher.update(owner.as_bytes());
    hasher.update(id.as_bytes());
    RecordKey(*hasher.finalize().as_bytes())
}

mod hex_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected 32 bytes"))
    }
}
