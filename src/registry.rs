//! Agent and capsule registration.

use crate::errors::{LedgerError, LedgerResult};
use crate::events::LedgerEventType;
use crate::key::{derive_key, RecordKey};
use crate::ledger::Ledger;
use crate::records::{Agent, Capsule};
use crate::types::{Amount, Call};
use tracing::info;

/// Fields of a new capsule listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCapsule {
    pub capsule_id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Amount,
}

impl NewCapsule {
    /// Capsule listing with empty description and category.
    pub fn new(capsule_id: impl Into<String>, name: impl Into<String>, price: Amount) -> Self {
        Self {
            capsule_id: capsule_id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            price,
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

impl Ledger {
    /// Register an agent identity for the caller.
    ///
    /// Fails with `EmptyString` / `InvalidMetadataLength` on bad ids or names
    /// and `AgentAlreadyExists` if the caller already owns `agent_id`.
    pub fn register_agent(
        &mut self,
        call: &Call,
        agent_id: &str,
        name: &str,
        display_name: &str,
        platform: &str,
    ) -> LedgerResult<RecordKey> {
        self.atomically("register_agent", |ledger| {
            let limits = ledger.limits();
            Self::check_string("agent_id", agent_id, limits.max_id_length)?;
            Self::check_string("name", name, limits.max_name_length)?;

            let key = derive_key(&call.caller, agent_id);
            if ledger.store.agent(&key).is_some() {
                return Err(LedgerError::AgentAlreadyExists {
                    key: key.to_string(),
                });
            }

            let agent = Agent::new(
                call.caller.clone(),
                agent_id.to_string(),
                name.to_string(),
                display_name.to_string(),
                platform.to_string(),
                call.now,
            );
            ledger.store.put_agent(key, agent);
            ledger
                .store
                .push_owned_agent(call.caller.clone(), agent_id.to_string());
            ledger.store.record(
                LedgerEventType::AgentRegistered {
                    owner: call.caller.clone(),
                    agent_key: key,
                    agent_id: agent_id.to_string(),
                    name: name.to_string(),
                },
                call.now,
            );

            info!(owner = %call.caller, agent_id, key = %key, "agent registered");
            Ok(key)
        })
    }

    /// List a new capsule owned by the caller.
    pub fn create_capsule(&mut self, call: &Call, new: NewCapsule) -> LedgerResult<RecordKey> {
        self.atomically("create_capsule", |ledger| {
            let limits = ledger.limits();
            Self::check_string("capsule_id", &new.capsule_id, limits.max_id_length)?;
            Self::check_length("name", &new.name, limits.max_name_length)?;
            ledger.check_price(new.price)?;

            let key = derive_key(&call.caller, &new.capsule_id);
            if ledger.store.capsule(&key).is_some() {
                return Err(LedgerError::CapsuleAlreadyExists {
                    key: key.to_string(),
                });
            }

            let price = new.price;
            let capsule_id = new.capsule_id.clone();
            let capsule = Capsule {
                creator: call.caller.clone(),
                capsule_id: new.capsule_id,
                name: new.name,
                description: new.description,
                category: new.category,
                price,
                total_stake: Amount::zero(),
                earnings: Amount::zero(),
                created_at: call.now,
                updated_at: call.now,
                exists: true,
            };
            ledger.store.put_capsule(key, capsule);
            ledger
                .store
                .push_owned_capsule(call.caller.clone(), capsule_id.clone());
            ledger.store.record(
                LedgerEventType::CapsuleCreated {
                    creator: call.caller.clone(),
                    capsule_key: key,
                    capsule_id: capsule_id.clone(),
                    price,
                },
                call.now,
            );

            info!(creator = %call.caller, capsule_id = %capsule_id, price = %price, "capsule created");
            Ok(key)
        })
    }

    /// Change the price of one of the caller's capsules.
    pub fn update_capsule_price(
        &mut self,
        call: &Call,
        capsule_id: &str,
        new_price: Amount,
    ) -> LedgerResult<()> {
        self.atomically("update_capsule_price", |ledger| {
            ledger.check_price(new_price)?;

            let key = derive_key(&call.caller, capsule_id);
            let mut capsule = ledger
                .store
                .capsule(&key)
                .cloned()
                .ok_or_else(|| LedgerError::CapsuleNotFound {
                    key: key.to_string(),
                })?;
            if capsule.creator != call.caller {
                return Err(LedgerError::Unauthorized {
                    caller: call.caller.to_string(),
                    action: "update capsule price".into(),
                });
            }

            let old_price = capsule.price;
            capsule.price = new_price;
            capsule.touch(call.now);
            ledger.store.put_capsule(key, capsule);
            ledger.store.record(
                LedgerEventType::PriceUpdated {
                    creator: call.caller.clone(),
                    capsule_key: key,
                    capsule_id: capsule_id.to_string(),
                    old_price,
                    new_price,
                },
                call.now,
            );

            info!(capsule_id, old = %old_price, new = %new_price, "capsule price updated");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::{MAX_PRICE_PER_QUERY, MIN_PRICE_PER_QUERY};
    use crate::types::Principal;
    use chrono::{Duration, TimeZone, Utc};

    fn alice() -> Call {
        Call::new("0xA11CE", Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())
    }

    fn cap(id: &str, price: u128) -> NewCapsule {
        NewCapsule::new(id, "Market Memory", Amount::new(price))
            .description("curated trading notes")
            .category("Finance")
    }

    #[test]
    fn test_register_agent() {
        let mut ledger = Ledger::default();
        let call = alice();
        let key = ledger
            .register_agent(&call, "agent1", "Agent One", "One", "openai")
            .unwrap();

        let agent = ledger.store.agent(&key).unwrap();
        assert_eq!(agent.reputation, 10_000);
        assert_eq!(agent.created_at, call.now);
        assert_eq!(agent.owner, call.caller);
        assert_eq!(ledger.store.agents_by_owner(&call.caller), ["agent1"]);
        assert_eq!(ledger.store.agent_log().len(), 1);
    }

    #[test]
    fn test_register_agent_validation() {
        let mut ledger = Ledger::default();
        let call = alice();

        let err = ledger.register_agent(&call, "", "n", "", "").unwrap_err();
        assert_eq!(err.code(), "EMPTY_STRING");
        let err = ledger.register_agent(&call, "a", "", "", "").unwrap_err();
        assert_eq!(err.code(), "EMPTY_STRING");
        let err = ledger
            .register_agent(&call, &"x".repeat(33), "n", "", "")
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_METADATA_LENGTH");
        let err = ledger
            .register_agent(&call, "a", &"n".repeat(129), "", "")
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_METADATA_LENGTH");

        assert!(ledger.store.agent_log().is_empty());
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let mut ledger = Ledger::default();
        let call = alice();
        ledger
            .register_agent(&call, "agent1", "Agent One", "", "")
            .unwrap();
        let err = ledger
            .register_agent(&call, "agent1", "Other", "", "")
            .unwrap_err();
        assert_eq!(err.code(), "AGENT_ALREADY_EXISTS");
        assert_eq!(ledger.store.agents_by_owner(&call.caller).len(), 1);

        // Same id, different owner is a different agent
        let bob = Call::new("0xB0B", call.now);
        assert!(ledger.register_agent(&bob, "agent1", "Bob's", "", "").is_ok());
    }

    #[test]
    fn test_create_capsule() {
        let mut ledger = Ledger::default();
        let call = alice();
        let key = ledger
            .create_capsule(&call, cap("cap1", 50_000_000_000_000_000))
            .unwrap();

        let capsule = ledger.store.capsule(&key).unwrap();
        assert_eq!(capsule.total_stake, Amount::zero());
        assert_eq!(capsule.earnings, Amount::zero());
        assert_eq!(capsule.created_at, capsule.updated_at);
        assert_eq!(capsule.category, "Finance");
        assert_eq!(ledger.store.capsules_by_owner(&call.caller), ["cap1"]);

        let err = ledger
            .create_capsule(&call, cap("cap1", 50_000_000_000_000_000))
            .unwrap_err();
        assert_eq!(err.code(), "CAPSULE_ALREADY_EXISTS");
    }

    #[test]
    fn test_create_capsule_price_bounds() {
        let mut ledger = Ledger::default();
        let call = alice();

        let err = ledger
            .create_capsule(&call, cap("low", MIN_PRICE_PER_QUERY.value() - 1))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PRICE");
        let err = ledger
            .create_capsule(&call, cap("high", MAX_PRICE_PER_QUERY.value() + 1))
            .unwrap_err();
        assert_eq!(err.code(), "PRICE_TOO_HIGH");

        assert!(ledger
            .create_capsule(&call, cap("min", MIN_PRICE_PER_QUERY.value()))
            .is_ok());
        assert!(ledger
            .create_capsule(&call, cap("max", MAX_PRICE_PER_QUERY.value()))
            .is_ok());
    }

    #[test]
    fn test_update_price() {
        let mut ledger = Ledger::default();
        let call = alice();
        let key = ledger
            .create_capsule(&call, cap("cap1", 50_000_000_000_000_000))
            .unwrap();

        let later = Call::new(call.caller.clone(), call.now + Duration::seconds(60));
        ledger
            .update_capsule_price(&later, "cap1", Amount::new(70_000_000_000_000_000))
            .unwrap();

        let capsule = ledger.store.capsule(&key).unwrap();
        assert_eq!(capsule.price, Amount::new(70_000_000_000_000_000));
        assert_eq!(capsule.updated_at, later.now);
        assert_eq!(ledger.store.capsule_log().len(), 2);
    }

    #[test]
    fn test_update_price_failures() {
        let mut ledger = Ledger::default();
        let call = alice();
        ledger
            .create_capsule(&call, cap("cap1", 50_000_000_000_000_000))
            .unwrap();

        let err = ledger
            .update_capsule_price(&call, "cap1", Amount::new(1))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PRICE");

        // Bob's key for "cap1" points nowhere
        let bob = Call::new(Principal::new("0xB0B"), call.now);
        let err = ledger
            .update_capsule_price(&bob, "cap1", MIN_PRICE_PER_QUERY)
            .unwrap_err();
        assert_eq!(err.code(), "CAPSULE_NOT_FOUND");
    }
}
