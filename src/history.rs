//! Append-only history logs.
//!
//! Off-chain consumers replay the ledger from these logs without an indexer.
//! There are two logs, one for agents and one for capsules; a global
//! sequence number orders entries across both. Each entry is hash-chained to
//! its predecessor in the same log so a replayed copy can be checked for
//! tampering.

use crate::events::LedgerEventType;
use crate::types::BlockTime;
use serde::{Deserialize, Serialize};

/// Hash value used before the first entry of a log.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// One immutable log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Global execution order.
    pub sequence: u64,

    /// Position within this log.
    pub position: u64,

    pub event: LedgerEventType,
    pub timestamp: BlockTime,

    /// Hash of the previous entry in this log.
    pub previous_hash: String,

    /// This entry's hash.
    pub hash: String,
}

impl HistoryEntry {
    fn compute_hash(
        previous_hash: &str,
        sequence: u64,
        position: u64,
        event: &LedgerEventType,
        timestamp: &BlockTime,
    ) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(previous_hash.as_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.update(&position.to_le_bytes());
        hasher.update(&serde_json::to_vec(event).unwrap_or_default());
        hasher.update(timestamp.to_rfc3339().as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Read position for paginated log access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// First position to return.
    pub offset: usize,

    /// Page size; the ledger's default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Cursor {
    /// First page with the default size.
    pub fn start() -> Self {
        Self::default()
    }

    /// Page starting at `offset`.
    pub fn at(offset: usize) -> Self {
        Self {
            offset,
            limit: None,
        }
    }

    /// Request at most `limit` items.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A page of results in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// Where the next page starts; `None` at the end.
    pub next_cursor: Option<Cursor>,

    /// Total entries in the underlying log.
    pub total: usize,
}

/// A single append-only, hash-chained log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Hash of the newest entry, or [`GENESIS_HASH`].
    pub fn last_hash(&self) -> &str {
        self.entries
            .last()
            .map(|e| e.hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    pub(crate) fn append(&mut self, sequence: u64, event: LedgerEventType, timestamp: BlockTime) {
        let previous_hash = self.last_hash().to_string();
        let position = self.entries.len() as u64;
        let hash =
            HistoryEntry::compute_hash(&previous_hash, sequence, position, &event, &timestamp);
        self.entries.push(HistoryEntry {
            sequence,
            position,
            event,
            timestamp,
            previous_hash,
            hash,
        });
    }

    /// Drop entries appended after `len`. Only used to revert a failed operation.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    /// Slice the log at `offset`, clamping the page size to `max`.
    pub fn page(&self, cursor: Cursor, default_limit: usize, max: usize) -> Page<HistoryEntry> {
        let limit = cursor.limit.unwrap_or(default_limit).min(max).max(1);
        let start = cursor.offset.min(self.entries.len());
        let end = start.saturating_add(limit).min(self.entries.len());

        let next_cursor = (end < self.entries.len()).then(|| Cursor {
            offset: end,
            limit: cursor.limit,
        });

        Page {
            items: self.entries[start..end].to_vec(),
            next_cursor,
            total: self.entries.len(),
        }
    }

    /// Check that every entry hashes correctly and links to its predecessor.
    pub fn verify_chain(&self) -> bool {
        let mut previous = GENESIS_HASH;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.position != i as u64 || entry.previous_hash != previous {
                return false;
            }
            let expected = HistoryEntry::compute_hash(
                &entry.previous_hash,
                entry.sequence,
                entry.position,
                &entry.event,
                &entry.timestamp,
            );
            if entry.hash != expected {
                return false;
            }
            previous = entry.hash.as_str();
        }
        true
    }
}
