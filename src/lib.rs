//! Pactflow
//!
//! Negotiation and contract-lifecycle core for brand/creator collaborations:
//! - Metric-driven counter-offers and accept/counter/reject decisions
//! - Two-party contract signing with a status derived from the signatures
//! - Outreach messages handed to injected senders

pub mod cli;
pub mod config;
pub mod contract;
pub mod crypto;
pub mod error;
pub mod negotiation;
pub mod outreach;
pub mod types;

// Re-export commonly used types and functions
pub use config::AppConfig;
pub use contract::{
    sign, Contract, ContractManager, ContractStatus, ContractStore, ContractTerms,
    InMemoryContractStore, JsonFileContractStore, LifecycleEvent, Party, SignatureCapture,
};
pub use error::{PactError, Result};
pub use negotiation::{
    calculate_counter_offer, CreatorMetrics, CreatorProfile, NegotiationDecision,
    NegotiationEngine, NegotiationPolicy, Quotation, QuotationDraft,
};
pub use outreach::{OutreachMessage, OutreachSender};
pub use types::{ContractId, UserId};
