//! Contract types and the signature-derived status projection

use crate::crypto::contract_hash;
use crate::error::{PactError, Result};
use crate::types::{ContractId, Hash, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signing party
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    Brand,
    Influencer,
}

impl Party {
    pub fn as_str(&self) -> &'static str {
        match self {
            Party::Brand => "brand",
            Party::Influencer => "influencer",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Party {
    type Err = PactError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brand" | "business" => Ok(Party::Brand),
            "influencer" | "creator" => Ok(Party::Influencer),
            other => Err(PactError::InvalidInput(format!("unknown party: {}", other))),
        }
    }
}

/// Contract status, fully determined by which signatures are present
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Pending,
    BrandSigned,
    InfluencerSigned,
    FullySigned,
}

impl ContractStatus {
    /// Project the two signature slots onto a status
    pub fn from_signatures(brand_signed: bool, influencer_signed: bool) -> Self {
        match (brand_signed, influencer_signed) {
            (false, false) => ContractStatus::Pending,
            (true, false) => ContractStatus::BrandSigned,
            (false, true) => ContractStatus::InfluencerSigned,
            (true, true) => ContractStatus::FullySigned,
        }
    }

    /// Check if the contract can take no further signatures
    pub fn is_terminal(&self) -> bool {
        matches!(self, ContractStatus::FullySigned)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::BrandSigned => "brand_signed",
            ContractStatus::InfluencerSigned => "influencer_signed",
            ContractStatus::FullySigned => "fully_signed",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commercial terms agreed before a contract is drawn up
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContractTerms {
    pub brand_id: UserId,
    pub creator_id: UserId,
    pub product: String,
    pub rate: Decimal,
    pub timeline: String,
}

impl ContractTerms {
    pub fn validate(&self) -> Result<()> {
        if self.brand_id.0.trim().is_empty() {
            return Err(PactError::InvalidInput("brand id is required".to_string()));
        }
        if self.creator_id.0.trim().is_empty() {
            return Err(PactError::InvalidInput("creator id is required".to_string()));
        }
        if self.product.trim().is_empty() {
            return Err(PactError::InvalidInput("product name is required".to_string()));
        }
        if self.rate < Decimal::ZERO {
            return Err(PactError::InvalidInput(format!(
                "rate must be a non-negative amount, got {}",
                self.rate
            )));
        }
        if self.timeline.trim().is_empty() {
            return Err(PactError::InvalidInput("timeline is required".to_string()));
        }
        Ok(())
    }
}

/// What the signature pad hands over
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignatureCapture {
    #[serde(with = "hex::serde")]
    pub image: Vec<u8>,
    /// False when the canvas was left empty
    pub has_ink: bool,
    pub captured_at: DateTime<Utc>,
}

impl SignatureCapture {
    pub fn new(image: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        let has_ink = !image.is_empty();
        Self {
            image,
            has_ink,
            captured_at,
        }
    }

    /// An empty canvas does not count as a signature
    pub fn is_blank(&self) -> bool {
        !self.has_ink || self.image.is_empty()
    }
}

/// A recorded signature
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
    pub digest: Hash,
    pub signed_at: DateTime<Utc>,
}

/// Brand/creator contract.
///
/// Signature slots are only written through [`crate::contract::sign`];
/// `status()` is recomputed from them on every call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    id: ContractId,
    terms: ContractTerms,
    content_hash: String,
    created_at: DateTime<Utc>,
    brand_signature: Option<Signature>,
    influencer_signature: Option<Signature>,
    #[serde(default)]
    version: u64,
}

impl Contract {
    /// Draw up a new unsigned contract
    pub fn new(terms: ContractTerms, created_at: DateTime<Utc>) -> Result<Self> {
        Self::with_id(ContractId::generate(), terms, created_at)
    }

    /// Draw up a new unsigned contract under a caller-chosen id
    pub fn with_id(id: ContractId, terms: ContractTerms, created_at: DateTime<Utc>) -> Result<Self> {
        terms.validate()?;
        let content_hash = contract_hash(&terms);

        Ok(Self {
            id,
            terms,
            content_hash,
            created_at,
            brand_signature: None,
            influencer_signature: None,
            version: 0,
        })
    }

    pub fn id(&self) -> &ContractId {
        &self.id
    }

    pub fn terms(&self) -> &ContractTerms {
        &self.terms
    }

    pub fn product(&self) -> &str {
        &self.terms.product
    }

    pub fn rate(&self) -> Decimal {
        self.terms.rate
    }

    pub fn timeline(&self) -> &str {
        &self.terms.timeline
    }

    /// SHA-256 fingerprint of the terms
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Storage version used for compare-and-swap writes
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn brand_signature(&self) -> Option<&Signature> {
        self.brand_signature.as_ref()
    }

    pub fn influencer_signature(&self) -> Option<&Signature> {
        self.influencer_signature.as_ref()
    }

    /// Signature recorded for `party`, if any
    pub fn signature(&self, party: Party) -> Option<&Signature> {
        match party {
            Party::Brand => self.brand_signature(),
            Party::Influencer => self.influencer_signature(),
        }
    }

    pub fn has_signed(&self, party: Party) -> bool {
        self.signature(party).is_some()
    }

    /// Current status derived from the signature slots
    pub fn status(&self) -> ContractStatus {
        ContractStatus::from_signatures(
            self.brand_signature.is_some(),
            self.influencer_signature.is_some(),
        )
    }

    pub fn is_fully_signed(&self) -> bool {
        self.status() == ContractStatus::FullySigned
    }

    pub(crate) fn slot_mut(&mut self, party: Party) -> &mut Option<Signature> {
        match party {
            Party::Brand => &mut self.brand_signature,
            Party::Influencer => &mut self.influencer_signature,
        }
    }

    pub(crate) fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}
