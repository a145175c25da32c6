//! Metric-driven counter-offer pricing

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PactError, Result};
use crate::types::round_to_cents;

use super::types::{validate_price, CreatorMetrics};

/// Lowest multiplier the counter-offer may apply to the quoted price
pub const MIN_PRICE_MULTIPLIER: f64 = 0.8;
/// Highest multiplier the counter-offer may apply to the quoted price
pub const MAX_PRICE_MULTIPLIER: f64 = 1.2;

/// Breakdown of how the metrics moved the price
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingFactors {
    pub engagement: f64,
    pub follower: f64,
    pub cpm: f64,
    /// Unclamped adjustment before the ±20% band is applied
    pub adjustment: f64,
    /// Multiplier actually applied to the quoted price
    pub multiplier: Decimal,
}

impl PricingFactors {
    pub fn from_metrics(metrics: &CreatorMetrics) -> Result<Self> {
        metrics.validate()?;

        // Engagement is halved then held to 0.5..=5 percent
        let engagement = (metrics.engagement_rate() / 2.0).clamp(0.5, 5.0) / 100.0;
        let follower = (metrics.followers() as f64).log10() * 0.1;
        let cpm = metrics.cpm() / 1000.0;

        let adjustment = 1.0 + engagement + follower + cpm * 0.1;
        let clamped = adjustment.clamp(MIN_PRICE_MULTIPLIER, MAX_PRICE_MULTIPLIER);
        // Float noise past 12 places is dropped before it reaches money
        let multiplier = Decimal::from_f64(clamped)
            .map(|m| m.round_dp(12))
            .ok_or_else(|| {
                PactError::InvalidInput(format!("price multiplier {} is not representable", clamped))
            })?;

        Ok(Self {
            engagement,
            follower,
            cpm,
            adjustment,
            multiplier,
        })
    }
}

/// Counter-offer for `original_price` given the creator's metrics.
///
/// The result always lies within 80%..=120% of the original price and is
/// rounded to cents. A price too large to scale is `InvalidInput`.
pub fn calculate_counter_offer(original_price: Decimal, metrics: &CreatorMetrics) -> Result<Decimal> {
    validate_price(original_price)?;

    let factors = PricingFactors::from_metrics(metrics)?;
    tracing::debug!(
        %original_price,
        engagement = factors.engagement,
        follower = factors.follower,
        cpm = factors.cpm,
        adjustment = factors.adjustment,
        multiplier = %factors.multiplier,
        "Computed counter-offer factors"
    );

    let scaled = original_price.checked_mul(factors.multiplier).ok_or_else(|| {
        PactError::InvalidInput(format!("price {} is too large to counter", original_price))
    })?;
    Ok(round_to_cents(scaled))
}
