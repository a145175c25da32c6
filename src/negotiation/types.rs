//! Negotiation inputs, decisions and policy

use crate::error::{PactError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Creator performance metrics read from the creator profile.
///
/// Every field is optional; absent values price neutrally (engagement and
/// CPM as 0, follower count as 1).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorMetrics {
    #[serde(default)]
    pub avg_engagement_rate: Option<f64>,
    #[serde(default, deserialize_with = "whole_count")]
    pub follower_count: Option<i64>,
    #[serde(default, rename = "avgCPM")]
    pub avg_cpm: Option<f64>,
}

impl CreatorMetrics {
    pub fn new(avg_engagement_rate: f64, follower_count: i64, avg_cpm: f64) -> Self {
        Self {
            avg_engagement_rate: Some(avg_engagement_rate),
            follower_count: Some(follower_count),
            avg_cpm: Some(avg_cpm),
        }
    }

    /// Engagement rate in percent, 0 when absent
    pub fn engagement_rate(&self) -> f64 {
        self.avg_engagement_rate.unwrap_or(0.0)
    }

    /// Follower count floored at 1 so its logarithm stays defined
    pub fn followers(&self) -> i64 {
        self.follower_count.unwrap_or(1).max(1)
    }

    /// Average CPM, 0 when absent
    pub fn cpm(&self) -> f64 {
        self.avg_cpm.unwrap_or(0.0)
    }

    /// Reject NaN and infinite metric values
    pub fn validate(&self) -> Result<()> {
        if !self.engagement_rate().is_finite() {
            return Err(PactError::InvalidInput(
                "avgEngagementRate must be a finite number".to_string(),
            ));
        }
        if !self.cpm().is_finite() {
            return Err(PactError::InvalidInput(
                "avgCPM must be a finite number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(i64),
    Float(f64),
}

/// Follower counts sometimes arrive as `100000.0`; accept any whole number
fn whole_count<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawCount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCount::Int(count)) => Ok(Some(count)),
        Some(RawCount::Float(count))
            if count.is_finite() && count.fract() == 0.0 && count.abs() < i64::MAX as f64 =>
        {
            Ok(Some(count as i64))
        }
        Some(RawCount::Float(count)) => Err(D::Error::custom(format!(
            "followerCount must be a whole number, got {}",
            count
        ))),
    }
}

/// The pricing-relevant slice of a creator profile
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatorProfile {
    #[serde(default)]
    pub metrics: Option<CreatorMetrics>,
    #[serde(default)]
    pub minimum_rate: Option<Decimal>,
}

impl CreatorProfile {
    /// Minimum rate if one is set; zero or negative rates count as unset
    pub fn effective_minimum_rate(&self) -> Option<Decimal> {
        self.minimum_rate.filter(|rate| *rate > Decimal::ZERO)
    }

    /// Reject non-finite metrics
    pub fn validate(&self) -> Result<()> {
        match &self.metrics {
            Some(metrics) => metrics.validate(),
            None => Ok(()),
        }
    }
}

/// Quotation as it arrives from the caller, before validation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDraft {
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A brand's validated offer to a creator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub price: Decimal,
    pub deadline: DateTime<Utc>,
    pub deliverables: Vec<String>,
    pub notes: Option<String>,
}

impl Quotation {
    /// Quotation with a single deliverable, mostly for callers that only price
    pub fn new(price: Decimal, deadline: DateTime<Utc>, deliverable: impl Into<String>) -> Result<Self> {
        Self::try_from(QuotationDraft {
            price: Some(price),
            deadline: Some(deadline),
            deliverables: vec![deliverable.into()],
            notes: None,
        })
    }

    /// Check the price is a positive amount
    pub fn validate_price(&self) -> Result<()> {
        validate_price(self.price)
    }
}

pub(crate) fn validate_price(price: Decimal) -> Result<()> {
    if price <= Decimal::ZERO {
        return Err(PactError::InvalidInput(format!(
            "quotation price must be a positive amount, got {}",
            price
        )));
    }
    Ok(())
}

impl TryFrom<QuotationDraft> for Quotation {
    type Error = PactError;

    fn try_from(draft: QuotationDraft) -> Result<Self> {
        let price = draft
            .price
            .ok_or_else(|| PactError::InvalidInput("quotation price is missing".to_string()))?;
        validate_price(price)?;

        let deadline = draft
            .deadline
            .ok_or_else(|| PactError::InvalidInput("quotation deadline is missing".to_string()))?;

        if draft.deliverables.is_empty() {
            return Err(PactError::InvalidInput(
                "at least one deliverable is required".to_string(),
            ));
        }
        if draft.deliverables.iter().any(|d| d.trim().is_empty()) {
            return Err(PactError::InvalidInput(
                "deliverable cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            price,
            deadline,
            deliverables: draft.deliverables,
            notes: draft.notes,
        })
    }
}

/// Status of a quotation after the creator responds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl QuotationStatus {
    /// Status after applying a response; a counter keeps the quotation open
    pub fn after(self, decision: &NegotiationDecision) -> Self {
        match decision {
            NegotiationDecision::Accept { .. } => QuotationStatus::Accepted,
            NegotiationDecision::Reject { .. } => QuotationStatus::Rejected,
            NegotiationDecision::Counter { .. } => self,
        }
    }
}

/// Creator stance on a quotation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum NegotiationDecision {
    Accept {
        notes: String,
    },
    Counter {
        #[serde(rename = "counterPrice")]
        counter_price: Decimal,
        notes: String,
    },
    Reject {
        notes: String,
    },
}

impl NegotiationDecision {
    pub fn notes(&self) -> &str {
        match self {
            NegotiationDecision::Accept { notes }
            | NegotiationDecision::Counter { notes, .. }
            | NegotiationDecision::Reject { notes } => notes,
        }
    }

    /// Short label used in logs and outreach subjects
    pub fn label(&self) -> &'static str {
        match self {
            NegotiationDecision::Accept { .. } => "accept",
            NegotiationDecision::Counter { .. } => "counter",
            NegotiationDecision::Reject { .. } => "reject",
        }
    }
}

/// Thresholds the engine applies when turning a counter price into a decision
#[derive(Clone, Debug, PartialEq)]
pub struct NegotiationPolicy {
    /// Share of the quoted price accepted when the creator set no minimum rate
    pub default_floor_ratio: Decimal,
    /// Share of the minimum acceptable price above which a counter is offered
    pub counter_band_ratio: Decimal,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self {
            default_floor_ratio: Decimal::new(7, 1),
            counter_band_ratio: Decimal::new(9, 1),
        }
    }
}
