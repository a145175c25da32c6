//! Pactflow application wiring engine, contracts and outreach together

use crate::config::AppConfig;
use crate::contract::{
    Contract, ContractManager, ContractStore, ContractTerms, JsonFileContractStore, LifecycleEvent,
    Party, SignOutcome, SignatureCapture,
};
use crate::error::Result;
use crate::negotiation::{
    calculate_counter_offer, CreatorMetrics, CreatorProfile, Evaluation, NegotiationEngine,
    Quotation, QuotationDraft, QuotationStatus,
};
use crate::outreach::{
    decision_reply, fully_executed_notice, validate_recipient, DeliveryReceipt, OutreachSender,
    TracingSender,
};
use crate::types::{ContractId, UserId};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Outcome of answering a quotation
#[derive(Clone, Debug)]
pub struct QuotationReply {
    pub evaluation: Evaluation,
    pub status: QuotationStatus,
    pub receipt: Option<DeliveryReceipt>,
}

/// Confirmation that could not be delivered for a committed contract
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFailure {
    pub contract_id: ContractId,
    pub reason: String,
}

/// What happened to the confirmations produced while draining events
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DispatchReport {
    pub delivered: Vec<DeliveryReceipt>,
    pub failed: Vec<DeliveryFailure>,
}

/// Outcome of signing plus the confirmations it triggered
#[derive(Clone, Debug)]
pub struct SignReply {
    pub outcome: SignOutcome,
    pub notifications: DispatchReport,
}

/// Main Pactflow application
#[derive(Clone)]
pub struct PactApp {
    engine: NegotiationEngine,
    contracts: Arc<ContractManager>,
    sender: Arc<dyn OutreachSender>,
    events: Arc<Mutex<mpsc::UnboundedReceiver<LifecycleEvent>>>,
}

impl PactApp {
    /// Create an application over injected collaborators
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn ContractStore>,
        sender: Arc<dyn OutreachSender>,
    ) -> Self {
        let (manager, events) = ContractManager::new(store, config.max_sign_retries);

        Self {
            engine: NegotiationEngine::new(config.policy.clone()),
            contracts: Arc::new(manager),
            sender,
            events: Arc::new(Mutex::new(events)),
        }
    }

    /// Application backed by the JSON store and a logging sender
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(JsonFileContractStore::new(config.store_path.clone()));
        let sender = Arc::new(TracingSender::new(config.sender_email.clone()));
        Self::new(config, store, sender)
    }

    /// Get negotiation engine
    pub fn engine(&self) -> &NegotiationEngine {
        &self.engine
    }

    /// Get contract manager
    pub fn contracts(&self) -> Arc<ContractManager> {
        self.contracts.clone()
    }

    /// Metric-adjusted counter-offer for a price
    pub fn counter_offer(&self, price: Decimal, metrics: &CreatorMetrics) -> Result<Decimal> {
        calculate_counter_offer(price, metrics)
    }

    /// Evaluate a quotation and optionally email the decision back
    pub fn respond_to_quotation(
        &self,
        draft: QuotationDraft,
        profile: &CreatorProfile,
        reply_to: Option<&str>,
    ) -> Result<QuotationReply> {
        let quotation = Quotation::try_from(draft)?;
        let evaluation = self.engine.evaluate(&quotation, profile)?;
        let status = QuotationStatus::Pending.after(&evaluation.decision);

        let receipt = match reply_to {
            Some(recipient) => {
                let message = decision_reply(&evaluation.decision, &quotation, recipient)?;
                Some(self.sender.send(&message)?)
            }
            None => None,
        };

        Ok(QuotationReply {
            evaluation,
            status,
            receipt,
        })
    }

    /// Draw up a new contract
    pub fn create_contract(&self, terms: ContractTerms) -> Result<Contract> {
        self.contracts.create(terms, Utc::now())
    }

    /// Record a signature captured now
    pub fn sign_contract(&self, id: &ContractId, party: Party, image: Vec<u8>) -> Result<SignOutcome> {
        self.contracts
            .sign(id, party, SignatureCapture::new(image, Utc::now()))
    }

    /// Sign, then drain events and mail the confirmation to `notify`.
    ///
    /// The address is checked before anything is written. Once the signature
    /// is stored, delivery problems are reported instead of returned.
    pub async fn sign_and_notify(
        &self,
        id: &ContractId,
        party: Party,
        image: Vec<u8>,
        notify: Option<&str>,
    ) -> Result<SignReply> {
        if let Some(recipient) = notify {
            validate_recipient(recipient)?;
        }
        let outcome = self.sign_contract(id, party, image)?;
        let notifications = self.dispatch_events(notify).await;
        Ok(SignReply {
            outcome,
            notifications,
        })
    }

    /// Load a contract
    pub fn get_contract(&self, id: &ContractId) -> Result<Contract> {
        self.contracts.get(id)
    }

    /// List contracts, optionally restricted to one brand/creator pair
    pub fn list_contracts(&self, pair: Option<(&UserId, &UserId)>) -> Result<Vec<Contract>> {
        match pair {
            Some((brand, creator)) => self.contracts.contracts_between(brand, creator),
            None => self.contracts.list(),
        }
    }

    /// Poll for the next lifecycle event without waiting
    pub async fn poll_event(&self) -> Option<LifecycleEvent> {
        self.events.lock().await.try_recv().ok()
    }

    /// Drain pending lifecycle events, mailing a confirmation for every
    /// contract that became fully signed. Failed confirmations are logged and
    /// reported; draining always runs to the end.
    pub async fn dispatch_events(&self, notify: Option<&str>) -> DispatchReport {
        let mut report = DispatchReport::default();

        while let Some(event) = self.poll_event().await {
            match event {
                LifecycleEvent::Signed {
                    contract_id,
                    party,
                    status,
                } => {
                    tracing::debug!(%contract_id, %party, %status, "Lifecycle event");
                }
                LifecycleEvent::FullyExecuted { contract_id, product } => {
                    tracing::info!(%contract_id, %product, "Contract fully executed");
                    let Some(recipient) = notify else {
                        continue;
                    };
                    match self.confirm(&contract_id, recipient) {
                        Ok(receipt) => report.delivered.push(receipt),
                        Err(e) => {
                            tracing::warn!(%contract_id, error = %e, "Confirmation not delivered");
                            report.failed.push(DeliveryFailure {
                                contract_id,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        report
    }

    fn confirm(&self, contract_id: &ContractId, recipient: &str) -> Result<DeliveryReceipt> {
        let contract = self.contracts.get(contract_id)?;
        let message = fully_executed_notice(&contract, recipient)?;
        self.sender.send(&message)
    }
}

/// JSON view of a contract including its derived status
pub fn contract_summary(contract: &Contract) -> serde_json::Value {
    json!({
        "id": contract.id(),
        "status": contract.status(),
        "brandId": contract.terms().brand_id,
        "creatorId": contract.terms().creator_id,
        "product": contract.product(),
        "rate": contract.rate(),
        "timeline": contract.timeline(),
        "createdAt": contract.created_at(),
        "contentHash": contract.content_hash(),
        "brandSignedAt": contract.brand_signature().map(|s| s.signed_at),
        "influencerSignedAt": contract.influencer_signature().map(|s| s.signed_at),
        "version": contract.version(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::{ContractStatus, InMemoryContractStore};
    use crate::error::PactError;
    use crate::negotiation::NegotiationDecision;
    use crate::outreach::RecordingSender;
    use chrono::TimeZone;

    fn app() -> (PactApp, Arc<RecordingSender>) {
        let sender = Arc::new(RecordingSender::new());
        let app = PactApp::new(
            &AppConfig::default(),
            Arc::new(InMemoryContractStore::new()),
            sender.clone(),
        );
        (app, sender)
    }

    fn terms() -> ContractTerms {
        ContractTerms {
            brand_id: UserId::from("brand_a"),
            creator_id: UserId::from("creator_b"),
            product: "Running Watch".to_string(),
            rate: Decimal::from(1200),
            timeline: "6 weeks".to_string(),
        }
    }

    fn draft(price: i64) -> QuotationDraft {
        QuotationDraft {
            price: Some(Decimal::from(price)),
            deadline: Some(Utc.with_ymd_and_hms(2026, 12, 24, 0, 0, 0).unwrap()),
            deliverables: vec!["1 long-form video".to_string()],
            notes: None,
        }
    }

    #[test]
    fn test_respond_to_quotation_sends_reply() {
        let (app, sender) = app();
        let profile = CreatorProfile {
            metrics: Some(CreatorMetrics::new(4.0, 100_000, 20.0)),
            minimum_rate: Some(Decimal::from(1400)),
        };

        let reply = app
            .respond_to_quotation(draft(1000), &profile, Some("brand@example.com"))
            .unwrap();

        assert!(matches!(reply.evaluation.decision, NegotiationDecision::Reject { .. }));
        assert_eq!(reply.status, QuotationStatus::Rejected);
        assert!(reply.receipt.is_some());
        assert_eq!(sender.sent().unwrap()[0].subject, "Quotation declined");
    }

    #[test]
    fn test_respond_without_metadata_is_invalid() {
        let (app, sender) = app();
        let result = app.respond_to_quotation(QuotationDraft::default(), &CreatorProfile::default(), None);

        assert!(result.is_err());
        assert!(sender.sent().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_signature_flow_notifies_once() {
        let (app, sender) = app();
        let contract = app.create_contract(terms()).unwrap();

        app.sign_contract(contract.id(), Party::Brand, vec![1, 2]).unwrap();
        assert_eq!(app.dispatch_events(Some("ops@brand.io")).await, DispatchReport::default());

        app.sign_contract(contract.id(), Party::Influencer, vec![3, 4]).unwrap();
        let report = app.dispatch_events(Some("ops@brand.io")).await;

        assert_eq!(report.delivered.len(), 1);
        assert!(report.failed.is_empty());
        let sent = sender.sent().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Contract signed: Running Watch");
        assert_eq!(
            app.get_contract(contract.id()).unwrap().status(),
            ContractStatus::FullySigned
        );
    }

    #[tokio::test]
    async fn test_events_without_recipient_are_drained() {
        let (app, sender) = app();
        let contract = app.create_contract(terms()).unwrap();
        app.sign_contract(contract.id(), Party::Influencer, vec![1]).unwrap();
        app.sign_contract(contract.id(), Party::Brand, vec![2]).unwrap();

        assert_eq!(app.dispatch_events(None).await, DispatchReport::default());
        assert!(app.poll_event().await.is_none());
        assert!(sender.sent().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_confirmation_keeps_signature_and_drains() {
        let sender = Arc::new(RecordingSender::failing("smtp relay down"));
        let app = PactApp::new(
            &AppConfig::default(),
            Arc::new(InMemoryContractStore::new()),
            sender.clone(),
        );
        let contract = app.create_contract(terms()).unwrap();
        app.sign_contract(contract.id(), Party::Influencer, vec![1]).unwrap();

        let reply = app
            .sign_and_notify(contract.id(), Party::Brand, vec![2], Some("ops@brand.io"))
            .await
            .unwrap();

        assert!(reply.outcome.completed());
        assert!(reply.notifications.delivered.is_empty());
        assert_eq!(reply.notifications.failed.len(), 1);
        assert_eq!(&reply.notifications.failed[0].contract_id, contract.id());
        assert!(reply.notifications.failed[0].reason.contains("smtp relay down"));
        assert!(app.poll_event().await.is_none());
        assert_eq!(
            app.get_contract(contract.id()).unwrap().status(),
            ContractStatus::FullySigned
        );
    }

    #[tokio::test]
    async fn test_bad_notify_address_rejected_before_signing() {
        let (app, sender) = app();
        let contract = app.create_contract(terms()).unwrap();
        app.sign_contract(contract.id(), Party::Influencer, vec![1]).unwrap();

        let result = app
            .sign_and_notify(contract.id(), Party::Brand, vec![2], Some("nobody"))
            .await;

        assert!(matches!(result, Err(PactError::InvalidInput(_))));
        assert_eq!(
            app.get_contract(contract.id()).unwrap().status(),
            ContractStatus::InfluencerSigned
        );
        assert!(sender.sent().unwrap().is_empty());
    }

    #[test]
    fn test_contract_summary_reports_status() {
        let (app, _) = app();
        let contract = app.create_contract(terms()).unwrap();
        let signed = app
            .sign_contract(contract.id(), Party::Brand, vec![7])
            .unwrap()
            .contract;

        let summary = contract_summary(&signed);
        assert_eq!(summary["status"], "brand_signed");
        assert_eq!(summary["version"], 2);
        assert!(summary["influencerSignedAt"].is_null());
    }

    #[test]
    fn test_list_contracts_by_pair() {
        let (app, _) = app();
        app.create_contract(terms()).unwrap();
        let brand = UserId::from("brand_a");
        let creator = UserId::from("creator_b");
        let stranger = UserId::from("creator_z");

        assert_eq!(app.list_contracts(Some((&brand, &creator))).unwrap().len(), 1);
        assert!(app.list_contracts(Some((&brand, &stranger))).unwrap().is_empty());
        assert_eq!(app.list_contracts(None).unwrap().len(), 1);
    }
}
