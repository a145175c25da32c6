//! Outreach message composition

use crate::contract::Contract;
use crate::error::{PactError, Result};
use crate::negotiation::{NegotiationDecision, Quotation};
use crate::types::round_to_cents;
use serde::{Deserialize, Serialize};

/// Composed email handed to an [`OutreachSender`](super::OutreachSender)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl OutreachMessage {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self> {
        let message = Self {
            recipient: recipient.into().trim().to_string(),
            subject: subject.into(),
            body: body.into(),
        };
        message.validate()?;
        Ok(message)
    }

    pub fn validate(&self) -> Result<()> {
        validate_recipient(&self.recipient)?;
        if self.subject.trim().is_empty() {
            return Err(PactError::InvalidInput("subject is required".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(PactError::InvalidInput("body is required".to_string()));
        }
        Ok(())
    }
}

/// Check an address has a non-empty local part and domain
pub fn validate_recipient(recipient: &str) -> Result<()> {
    let (local, domain) = recipient.trim().split_once('@').unwrap_or(("", ""));
    if local.is_empty() || domain.is_empty() {
        return Err(PactError::InvalidInput(format!(
            "invalid recipient address: {:?}",
            recipient
        )));
    }
    Ok(())
}

/// Confirmation sent once both parties have signed
pub fn fully_executed_notice(contract: &Contract, recipient: &str) -> Result<OutreachMessage> {
    let subject = format!("Contract signed: {}", contract.product());

    let mut body = format!(
        "Both parties have signed the contract for {}.\n\n\
         Contract: {}\n\
         Rate: {:.2}\n\
         Timeline: {}\n\
         Fingerprint: {}\n",
        contract.product(),
        contract.id(),
        round_to_cents(contract.rate()),
        contract.timeline(),
        contract.content_hash(),
    );
    if let (Some(brand), Some(creator)) = (contract.brand_signature(), contract.influencer_signature()) {
        body.push_str(&format!(
            "\nBrand signed at {}\nCreator signed at {}\n",
            brand.signed_at.to_rfc3339(),
            creator.signed_at.to_rfc3339()
        ));
    }

    OutreachMessage::new(recipient, subject, body)
}

/// Creator's reply to a quotation
pub fn decision_reply(
    decision: &NegotiationDecision,
    quotation: &Quotation,
    recipient: &str,
) -> Result<OutreachMessage> {
    let subject = match decision {
        NegotiationDecision::Accept { .. } => "Quotation accepted".to_string(),
        NegotiationDecision::Counter { counter_price, .. } => {
            format!("Counter-offer: {:.2}", round_to_cents(*counter_price))
        }
        NegotiationDecision::Reject { .. } => "Quotation declined".to_string(),
    };

    let body = format!(
        "Quoted price: {:.2}\nDeadline: {}\nDeliverables: {}\n\n{}\n",
        round_to_cents(quotation.price),
        quotation.deadline.format("%Y-%m-%d"),
        quotation.deliverables.join(", "),
        decision.notes(),
    );

    OutreachMessage::new(recipient, subject, body)
}
