//! Negotiation module for metric-driven counter-offers

pub mod engine;
pub mod pricing;
pub mod types;

pub use engine::{Evaluation, NegotiationEngine};
pub use pricing::{calculate_counter_offer, PricingFactors};
pub use types::{
    CreatorMetrics, CreatorProfile, NegotiationDecision, NegotiationPolicy, Quotation,
    QuotationDraft, QuotationStatus,
};
