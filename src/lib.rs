//! # AnyMind Ledger v0.2.0
//!
//! Marketplace ledger for AI-agent identities and memory capsules.
//!
//! The ledger is the single source of truth for:
//!
//! - **Registry**: agents and capsules, keyed by (owner, id)
//! - **Staking**: creator self-stake with a 7-day lock per deposit
//! - **Settlement**: paid queries, exact-price crediting, full refunds of overpayment
//! - **Withdrawal**: payout of accumulated earnings
//! - **History**: append-only, hash-chained logs for off-chain replay
//! - **Events**: notifications published on commit
//!
//! ## Execution model
//!
//! Operations run one at a time against `&mut Ledger`. Each receives a
//! [`Call`] carrying the caller, the attached value and the block time.
//! A failing operation leaves no trace. Value leaves the ledger only through
//! a [`ValueTransfer`] implementation, after all bookkeeping is done, so a
//! transfer that calls back into the ledger sees the updated state.
//!
//! ## Usage
//!
//! ```rust
//! use anymind_ledger::prelude::*;
//! use chrono::Utc;
//!
//! let mut ledger = Ledger::default();
//! let mut wallets = Wallets::new();
//! let alice = Principal::new("0xA11CE");
//!
//! let call = Call::new(alice.clone(), Utc::now());
//! ledger
//!     .create_capsule(&call, NewCapsule::new("cap1", "Alpha", Amount::new(50_000_000_000_000_000)))
//!     .unwrap();
//!
//! let query = Call::new("0xB0B", Utc::now()).with_value(100_000_000_000_000_000u128);
//! let receipt = ledger.query_capsule(&query, &alice, "cap1", &mut wallets).unwrap();
//! assert_eq!(receipt.refund, Amount::new(50_000_000_000_000_000));
//! ```

pub mod config;
pub mod errors;
pub mod events;
pub mod history;
pub mod key;
pub mod ledger;
pub mod limits;
pub mod query;
pub mod records;
pub mod registry;
pub mod settlement;
pub mod staking;
mod store;
pub mod transfer;
pub mod types;
pub mod withdrawal;

// Re-export everything in prelude for convenience
pub mod prelude {
    pub use crate::config::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::history::*;
    pub use crate::key::*;
    pub use crate::ledger::*;
    pub use crate::limits::*;
    pub use crate::records::*;
    pub use crate::registry::*;
    pub use crate::settlement::*;
    pub use crate::transfer::*;
    pub use crate::types::*;
}

// Also re-export at crate root
pub use prelude::*;
