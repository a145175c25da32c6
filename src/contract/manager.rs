//! Contract manager applies lifecycle transitions through a store

use crate::error::Result;
use crate::types::{ContractId, UserId};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::lifecycle::{sign, LifecycleEvent, SignOutcome};
use super::store::ContractStore;
use super::types::{Contract, ContractTerms, Party, SignatureCapture};

/// Creates contracts and records signatures, retrying lost write races
pub struct ContractManager {
    store: Arc<dyn ContractStore>,
    event_tx: mpsc::UnboundedSender<LifecycleEvent>,
    max_sign_retries: u32,
}

impl ContractManager {
    /// Create manager over `store`; lifecycle events arrive on the returned receiver
    pub fn new(
        store: Arc<dyn ContractStore>,
        max_sign_retries: u32,
    ) -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let manager = Self {
            store,
            event_tx,
            max_sign_retries,
        };
        (manager, event_rx)
    }

    /// Get the backing store
    pub fn store(&self) -> Arc<dyn ContractStore> {
        self.store.clone()
    }

    /// Draw up and persist a new pending contract
    pub fn create(&self, terms: ContractTerms, created_at: DateTime<Utc>) -> Result<Contract> {
        let contract = Contract::new(terms, created_at)?;
        let stored = self.store.insert(contract)?;

        tracing::info!(
            contract_id = %stored.id(),
            product = stored.product(),
            rate = %stored.rate(),
            "Created contract"
        );
        Ok(stored)
    }

    /// Load a contract
    pub fn get(&self, id: &ContractId) -> Result<Contract> {
        self.store.load(id)
    }

    /// All known contracts
    pub fn list(&self) -> Result<Vec<Contract>> {
        self.store.list()
    }

    /// Contracts between a brand and a creator
    pub fn contracts_between(&self, brand_id: &UserId, creator_id: &UserId) -> Result<Vec<Contract>> {
        self.store.find_by_party(brand_id, creator_id)
    }

    /// Record a signature for `party`.
    ///
    /// Each attempt loads the latest contract, applies the transition and
    /// writes it back against the loaded version. A `StorageConflict` reloads
    /// and retries up to `max_sign_retries` times, so concurrent signatures by
    /// different parties both land.
    pub fn sign(&self, id: &ContractId, party: Party, capture: SignatureCapture) -> Result<SignOutcome> {
        let mut attempt = 0;
        loop {
            let current = self.store.load(id)?;
            let outcome = sign(&current, party, capture.clone())?;

            match self.store.save(&outcome.contract, current.version()) {
                Ok(saved) => {
                    for event in &outcome.events {
                        // Nobody listening is fine
                        let _ = self.event_tx.send(event.clone());
                    }
                    return Ok(SignOutcome {
                        contract: saved,
                        ..outcome
                    });
                }
                Err(e) if e.is_retryable() && attempt < self.max_sign_retries => {
                    attempt += 1;
                    tracing::warn!(contract_id = %id, %party, attempt, "Retrying signature after storage conflict");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
