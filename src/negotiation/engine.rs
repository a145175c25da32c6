//! Negotiation engine turns a quotation and a creator profile into a decision

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PactError, Result};
use crate::types::round_to_cents;

use super::pricing::{calculate_counter_offer, PricingFactors};
use super::types::{CreatorMetrics, CreatorProfile, NegotiationDecision, NegotiationPolicy, Quotation};

pub const ACCEPT_NOTE: &str = "This looks good to me!";
pub const REJECT_NOTE: &str = "This is below my minimum acceptable rate.";

/// Decision together with the numbers that produced it
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub decision: NegotiationDecision,
    pub counter_price: Decimal,
    pub min_acceptable_price: Decimal,
    pub factors: PricingFactors,
}

/// Stateless negotiation engine; all behaviour comes from its policy
#[derive(Clone, Debug, Default)]
pub struct NegotiationEngine {
    policy: NegotiationPolicy,
}

fn scale(amount: Decimal, ratio: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(ratio)
        .ok_or_else(|| PactError::InvalidInput(format!("amount {} overflows when scaled by {}", amount, ratio)))
}

impl NegotiationEngine {
    /// Create engine with the given policy
    pub fn new(policy: NegotiationPolicy) -> Self {
        Self { policy }
    }

    /// Get the active policy
    pub fn policy(&self) -> &NegotiationPolicy {
        &self.policy
    }

    /// Lowest price the creator will take for this quotation
    pub fn min_acceptable_price(&self, quotation: &Quotation, profile: &CreatorProfile) -> Result<Decimal> {
        match profile.effective_minimum_rate() {
            Some(rate) => Ok(rate),
            None => scale(quotation.price, self.policy.default_floor_ratio),
        }
    }

    /// Accept, counter or reject the quotation on behalf of the creator
    pub fn generate_response(
        &self,
        quotation: &Quotation,
        profile: &CreatorProfile,
    ) -> Result<NegotiationDecision> {
        self.evaluate(quotation, profile).map(|e| e.decision)
    }

    /// Same as [`generate_response`](Self::generate_response) but keeps the pricing trace
    pub fn evaluate(&self, quotation: &Quotation, profile: &CreatorProfile) -> Result<Evaluation> {
        quotation.validate_price()?;
        profile.validate()?;

        let default_metrics = CreatorMetrics::default();
        let metrics = profile.metrics.as_ref().unwrap_or(&default_metrics);

        let min_acceptable_price = self.min_acceptable_price(quotation, profile)?;
        let counter_floor = scale(min_acceptable_price, self.policy.counter_band_ratio)?;
        let counter_price = calculate_counter_offer(quotation.price, metrics)?;

        let decision = if counter_price >= min_acceptable_price {
            NegotiationDecision::Accept {
                notes: ACCEPT_NOTE.to_string(),
            }
        } else if counter_price >= counter_floor {
            NegotiationDecision::Counter {
                counter_price: min_acceptable_price,
                notes: format!(
                    "I can do this for {:.2} based on my rates.",
                    round_to_cents(min_acceptable_price)
                ),
            }
        } else {
            NegotiationDecision::Reject {
                notes: REJECT_NOTE.to_string(),
            }
        };

        tracing::info!(
            quoted = %quotation.price,
            %counter_price,
            %min_acceptable_price,
            decision = decision.label(),
            "Evaluated quotation"
        );

        Ok(Evaluation {
            decision,
            counter_price,
            min_acceptable_price,
            factors: PricingFactors::from_metrics(metrics)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn money(amount: i64) -> Decimal {
        Decimal::from(amount)
    }

    fn quotation(price: Decimal) -> Quotation {
        let deadline = Utc.with_ymd_and_hms(2026, 11, 30, 12, 0, 0).unwrap();
        Quotation::new(price, deadline, "2 sponsored videos").unwrap()
    }

    fn strong_profile(minimum_rate: Option<Decimal>) -> CreatorProfile {
        CreatorProfile {
            metrics: Some(CreatorMetrics::new(4.0, 100_000, 20.0)),
            minimum_rate,
        }
    }

    #[test]
    fn test_accept_when_counter_meets_minimum() {
        let engine = NegotiationEngine::default();
        let decision = engine
            .generate_response(&quotation(money(1000)), &strong_profile(Some(money(1200))))
            .unwrap();

        assert_eq!(
            decision,
            NegotiationDecision::Accept {
                notes: ACCEPT_NOTE.to_string()
            }
        );
    }

    #[test]
    fn test_reject_below_counter_band() {
        let engine = NegotiationEngine::default();
        let decision = engine
            .generate_response(&quotation(money(1000)), &strong_profile(Some(money(1400))))
            .unwrap();

        assert_eq!(
            decision,
            NegotiationDecision::Reject {
                notes: REJECT_NOTE.to_string()
            }
        );
    }

    #[test]
    fn test_counter_inside_band_offers_minimum() {
        // 1200 is within 90% of 1300 (1170), so counter at the minimum
        let engine = NegotiationEngine::default();
        let decision = engine
            .generate_response(&quotation(money(1000)), &strong_profile(Some(money(1300))))
            .unwrap();

        match decision {
            NegotiationDecision::Counter {
                counter_price,
                notes,
            } => {
                assert_eq!(counter_price, money(1300));
                assert_eq!(notes, "I can do this for 1300.00 based on my rates.");
            }
            other => panic!("expected counter, got {:?}", other),
        }
    }

    #[test]
    fn test_minimum_rate_is_compared_unrounded() {
        // 1200 falls short of 1200.004 by less than a cent
        let engine = NegotiationEngine::default();
        let minimum = Decimal::new(1_200_004, 3);
        let evaluation = engine
            .evaluate(&quotation(money(1000)), &strong_profile(Some(minimum)))
            .unwrap();

        assert_eq!(evaluation.counter_price, money(1200));
        assert_eq!(evaluation.min_acceptable_price, minimum);
        assert!(matches!(
            evaluation.decision,
            NegotiationDecision::Counter { counter_price, .. } if counter_price == minimum
        ));
    }

    #[test]
    fn test_counter_band_lower_edge_is_inclusive() {
        // Half of 2400 is exactly the 1200 counter price
        let engine = NegotiationEngine::new(NegotiationPolicy {
            default_floor_ratio: Decimal::new(7, 1),
            counter_band_ratio: Decimal::new(5, 1),
        });
        let evaluation = engine
            .evaluate(&quotation(money(1000)), &strong_profile(Some(money(2400))))
            .unwrap();
        assert!(matches!(evaluation.decision, NegotiationDecision::Counter { .. }));

        let below = engine
            .evaluate(&quotation(money(1000)), &strong_profile(Some(Decimal::new(240_001, 2))))
            .unwrap();
        assert!(matches!(below.decision, NegotiationDecision::Reject { .. }));
    }

    #[test]
    fn test_default_floor_without_minimum_rate() {
        let engine = NegotiationEngine::default();
        let profile = CreatorProfile::default();
        let evaluation = engine.evaluate(&quotation(money(1000)), &profile).unwrap();

        assert_eq!(evaluation.min_acceptable_price, money(700));
        assert_eq!(evaluation.counter_price, money(1005));
        assert!(matches!(evaluation.decision, NegotiationDecision::Accept { .. }));
    }

    #[test]
    fn test_custom_policy_changes_floor() {
        let engine = NegotiationEngine::new(NegotiationPolicy {
            default_floor_ratio: Decimal::ONE,
            counter_band_ratio: Decimal::new(5, 1),
        });
        // Weak metrics drive the counter to 80% of the quote
        let profile = CreatorProfile {
            metrics: Some(CreatorMetrics::new(0.0, 1, -5000.0)),
            minimum_rate: None,
        };
        let evaluation = engine.evaluate(&quotation(money(500)), &profile).unwrap();

        assert_eq!(evaluation.min_acceptable_price, money(500));
        assert_eq!(evaluation.counter_price, money(400));
        assert_eq!(
            evaluation.decision,
            NegotiationDecision::Counter {
                counter_price: money(500),
                notes: "I can do this for 500.00 based on my rates.".to_string(),
            }
        );
    }

    #[test]
    fn test_decision_policy_partitions_outcomes() {
        let engine = NegotiationEngine::default();
        let q = quotation(money(1000));
        let band = Decimal::new(9, 1);

        for minimum in [500, 1100, 1200, 1250, 1333, 1334, 1400, 5000].map(money) {
            let evaluation = engine.evaluate(&q, &strong_profile(Some(minimum))).unwrap();
            let counter = evaluation.counter_price;
            match evaluation.decision {
                NegotiationDecision::Accept { .. } => assert!(counter >= minimum),
                NegotiationDecision::Counter { counter_price, .. } => {
                    assert!(counter < minimum && counter >= band * minimum);
                    assert_eq!(counter_price, minimum);
                }
                NegotiationDecision::Reject { .. } => assert!(counter < band * minimum),
            }
        }
    }

    #[test]
    fn test_response_is_deterministic() {
        let engine = NegotiationEngine::default();
        let q = quotation(Decimal::new(8124, 1));
        let profile = strong_profile(Some(money(900)));

        let first = engine.generate_response(&q, &profile).unwrap();
        let second = engine.generate_response(&q, &profile).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_quotation_price_is_rejected() {
        let engine = NegotiationEngine::default();
        let mut q = quotation(money(100));
        q.price = money(-1);

        let result = engine.generate_response(&q, &CreatorProfile::default());
        assert!(matches!(result, Err(PactError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_metrics_are_rejected() {
        let engine = NegotiationEngine::default();
        let profile = CreatorProfile {
            metrics: Some(CreatorMetrics::new(2.0, 10, f64::INFINITY)),
            minimum_rate: None,
        };

        let result = engine.generate_response(&quotation(money(100)), &profile);
        assert!(matches!(result, Err(PactError::InvalidInput(_))));
    }
}
