//! Error types for ledger operations.
//!
//! Every failure is a distinct, named kind. A failing operation aborts as a
//! whole: no map, counter, log entry or notification survives it. Nothing is
//! retried inside the ledger; the caller decides what to do next.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerError {
    /// A required string argument was empty.
    #[error("{field} must not be empty")]
    EmptyString { field: String },

    /// A string argument exceeded its byte bound.
    #[error("{field} is {len} bytes, max is {max}")]
    InvalidMetadataLength { field: String, len: usize, max: usize },

    #[error("capsule {key} not found")]
    CapsuleNotFound { key: String },

    /// Price below the minimum per query.
    #[error("price {price} is below the minimum {min}")]
    InvalidPrice { price: u128, min: u128 },

    #[error("price {price} exceeds the maximum {max}")]
    PriceTooHigh { price: u128, max: u128 },

    /// Attached or requested amount is too small (or there is nothing to pay out).
    #[error("insufficient payment: got {provided}, need {required}")]
    InsufficientPayment { provided: u128, required: u128 },

    /// The value-transfer primitive refused the payout.
    #[error("transfer of {amount} to {to} failed: {reason}")]
    TransferFailed {
        to: String,
        amount: u128,
        reason: String,
    },

    #[error("stake {amount} exceeds the maximum {max}")]
    StakeTooHigh { amount: u128, max: u128 },

    /// No stake record, or the requested amount exceeds the staked balance.
    #[error("insufficient stake: have {available}, requested {requested}")]
    InsufficientStake { available: u128, requested: u128 },

    /// Unstake attempted before the lock expired.
    #[error("stake is locked until {lock_until}")]
    StakeLocked { lock_until: String },

    #[error("{caller} is not authorized to {action}")]
    Unauthorized { caller: String, action: String },

    #[error("agent {key} already exists")]
    AgentAlreadyExists { key: String },

    #[error("capsule {key} already exists")]
    CapsuleAlreadyExists { key: String },

    /// The ledger holds less value than it owes (liveness check).
    #[error("reserve {reserve} cannot cover {required}")]
    InsufficientReserve { reserve: u128, required: u128 },

    #[error("arithmetic overflow in {what}")]
    ArithmeticOverflow { what: String },

    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
}

impl LedgerError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyString { .. } => "EMPTY_STRING",
            Self::InvalidMetadataLength { .. } => "INVALID_METADATA_LENGTH",
            Self::CapsuleNotFound { .. } => "CAPSULE_NOT_FOUND",
            Self::InvalidPrice { .. } => "INVALID_PRICE",
            Self::PriceTooHigh { .. } => "PRICE_TOO_HIGH",
            Self::InsufficientPayment { .. } => "INSUFFICIENT_PAYMENT",
            Self::TransferFailed { .. } => "TRANSFER_FAILED",
            Self::StakeTooHigh { .. } => "STAKE_TOO_HIGH",
            Self::InsufficientStake { .. } => "INSUFFICIENT_STAKE",
            Self::StakeLocked { .. } => "STAKE_LOCKED",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::AgentAlreadyExists { .. } => "AGENT_ALREADY_EXISTS",
            Self::CapsuleAlreadyExists { .. } => "CAPSULE_ALREADY_EXISTS",
            Self::InsufficientReserve { .. } => "INSUFFICIENT_RESERVE",
            Self::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
        }
    }

    /// Whether the same call may succeed later without changing its inputs.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StakeLocked { .. } | Self::TransferFailed { .. })
    }

    /// Message for the UI layer: what went wrong and what to try.
    pub fn to_user_message(&self) -> String {
        let hint = match self {
            Self::EmptyString { .. } | Self::InvalidMetadataLength { .. } => {
                Some("shorten or fill in the field")
            }
            Self::InvalidPrice { .. } | Self::PriceTooHigh { .. } => {
                Some("choose a price within the published limits")
            }
            Self::StakeLocked { .. } => Some("wait until the lock expires"),
            Self::TransferFailed { .. } => Some("check that the recipient accepts funds"),
            Self::CapsuleNotFound { .. } => Some("check the creator address and capsule id"),
            _ => None,
        };
        match hint {
            Some(hint) => format!("Error: {}. Try: {}", self, hint),
            None => format!("Error: {}", self),
        }
    }

    pub(crate) fn empty(field: &str) -> Self {
        Self::EmptyString {
            field: field.to_string(),
        }
    }

    pub(crate) fn too_long(field: &str, len: usize, max: usize) -> Self {
        Self::InvalidMetadataLength {
            field: field.to_string(),
            len,
            max,
        }
    }

    pub(crate) fn overflow(what: &str) -> Self {
        Self::ArithmeticOverflow {
            what: what.to_string(),
        }
    }
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LedgerError::StakeLocked {
            lock_until: "2026-01-08T00:00:00Z".into(),
        };
        assert_eq!(err.code(), "STAKE_LOCKED");
        assert!(err.is_retryable());

        let err = LedgerError::empty("agent_id");
        assert_eq!(err.code(), "EMPTY_STRING");
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "agent_id must not be empty");
    }

    #[test]
    fn test_error_serialization() {
        let err = LedgerError::InsufficientPayment {
            provided: 1,
            required: 2,
        };
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("INSUFFICIENT_PAYMENT"));

        let recovered: LedgerError = serde_json::from_str(&json).unwrap();
        assert_eq!(recovered, err);
    }

    #[test]
    fn test_user_message() {
        let msg = LedgerError::InvalidPrice { price: 1, min: 10 }.to_user_message();
        assert!(msg.contains("below the minimum"));
        assert!(msg.contains("Try:"));

        let msg = LedgerError::Unauthorized {
            caller: "0xB0B".into(),
            action: "stake".into(),
        }
        .to_user_message();
        assert!(!msg.contains("Try:"));
    }
}
