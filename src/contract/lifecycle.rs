//! Two-party signature state machine

use crate::crypto::signature_digest;
use crate::error::{PactError, Result};
use crate::types::ContractId;
use serde::{Deserialize, Serialize};

use super::types::{Contract, ContractStatus, Party, Signature, SignatureCapture};

/// Events emitted for collaborators when a contract moves
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A party signed; `status` is the status after the signature
    Signed {
        contract_id: ContractId,
        party: Party,
        status: ContractStatus,
    },
    /// Both parties have signed
    FullyExecuted {
        contract_id: ContractId,
        product: String,
    },
}

/// Result of applying one signature
#[derive(Clone, Debug)]
pub struct SignOutcome {
    pub contract: Contract,
    pub previous: ContractStatus,
    pub events: Vec<LifecycleEvent>,
}

impl SignOutcome {
    /// Whether this signature completed the contract
    pub fn completed(&self) -> bool {
        !self.previous.is_terminal() && self.contract.is_fully_signed()
    }
}

/// Record `party`'s signature on a copy of `contract`.
///
/// A party can sign once; a second attempt fails with `DuplicateSignature`
/// and leaves the existing signature untouched. A blank capture is
/// `InvalidInput`. The input contract is never modified.
pub fn sign(contract: &Contract, party: Party, capture: SignatureCapture) -> Result<SignOutcome> {
    if capture.is_blank() {
        return Err(PactError::InvalidInput("signature is empty".to_string()));
    }

    if contract.has_signed(party) {
        tracing::warn!(contract_id = %contract.id(), %party, "Rejected duplicate signature");
        return Err(PactError::DuplicateSignature {
            contract_id: contract.id().to_string(),
            party,
        });
    }

    let previous = contract.status();
    let mut updated = contract.clone();

    *updated.slot_mut(party) = Some(Signature {
        digest: signature_digest(&capture.image),
        payload: capture.image,
        signed_at: capture.captured_at,
    });

    let status = updated.status();
    let mut events = vec![LifecycleEvent::Signed {
        contract_id: updated.id().clone(),
        party,
        status,
    }];

    if status == ContractStatus::FullySigned {
        tracing::info!(contract_id = %updated.id(), product = updated.product(), "Contract fully executed");
        events.push(LifecycleEvent::FullyExecuted {
            contract_id: updated.id().clone(),
            product: updated.product().to_string(),
        });
    } else {
        tracing::info!(contract_id = %updated.id(), %party, %status, "Contract signed");
    }

    Ok(SignOutcome {
        contract: updated,
        previous,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::types::ContractTerms;
    use crate::crypto::verify_signature;
    use crate::types::UserId;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn contract() -> Contract {
        let terms = ContractTerms {
            brand_id: UserId::from("brand_1"),
            creator_id: UserId::from("creator_2"),
            product: "Headphones".to_string(),
            rate: Decimal::from(800),
            timeline: "10 days".to_string(),
        };
        let created = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        Contract::with_id(ContractId::from("contract_test"), terms, created).unwrap()
    }

    fn ink(seed: u8) -> SignatureCapture {
        let at = Utc.with_ymd_and_hms(2026, 10, 2, 9, 0, 0).unwrap() + Duration::minutes(seed as i64);
        SignatureCapture::new(vec![seed, seed.wrapping_add(1), 0xff], at)
    }

    #[test]
    fn test_brand_then_influencer() {
        let pending = contract();

        let first = sign(&pending, Party::Brand, ink(1)).unwrap();
        assert_eq!(first.previous, ContractStatus::Pending);
        assert_eq!(first.contract.status(), ContractStatus::BrandSigned);
        assert!(!first.completed());
        assert_eq!(first.events.len(), 1);

        let second = sign(&first.contract, Party::Influencer, ink(2)).unwrap();
        assert_eq!(second.previous, ContractStatus::BrandSigned);
        assert_eq!(second.contract.status(), ContractStatus::FullySigned);
        assert!(second.completed());
        assert_eq!(
            second.events.last(),
            Some(&LifecycleEvent::FullyExecuted {
                contract_id: ContractId::from("contract_test"),
                product: "Headphones".to_string(),
            })
        );
    }

    #[test]
    fn test_influencer_then_brand() {
        let first = sign(&contract(), Party::Influencer, ink(3)).unwrap();
        assert_eq!(first.contract.status(), ContractStatus::InfluencerSigned);

        let second = sign(&first.contract, Party::Brand, ink(4)).unwrap();
        assert_eq!(second.contract.status(), ContractStatus::FullySigned);
    }

    #[test]
    fn test_duplicate_signature_is_rejected_without_overwrite() {
        let signed = sign(&contract(), Party::Brand, ink(5)).unwrap().contract;
        let original_at = signed.brand_signature().unwrap().signed_at;

        let err = sign(&signed, Party::Brand, ink(9)).unwrap_err();
        assert!(matches!(
            err,
            PactError::DuplicateSignature {
                party: Party::Brand,
                ..
            }
        ));
        assert_eq!(signed.brand_signature().unwrap().signed_at, original_at);
    }

    #[test]
    fn test_duplicate_after_fully_signed() {
        let once = sign(&contract(), Party::Brand, ink(1)).unwrap().contract;
        let both = sign(&once, Party::Influencer, ink(2)).unwrap().contract;

        assert!(sign(&both, Party::Influencer, ink(3)).is_err());
        assert!(sign(&both, Party::Brand, ink(4)).is_err());
        assert_eq!(both.status(), ContractStatus::FullySigned);
    }

    #[test]
    fn test_blank_signature_is_not_a_signature() {
        let pending = contract();
        let blank = SignatureCapture::new(Vec::new(), Utc::now());

        let err = sign(&pending, Party::Brand, blank).unwrap_err();
        assert!(matches!(err, PactError::InvalidInput(_)));
        assert_eq!(pending.status(), ContractStatus::Pending);
    }

    #[test]
    fn test_signature_records_payload_and_timestamp() {
        let capture = ink(7);
        let expected_at = capture.captured_at;
        let signed = sign(&contract(), Party::Influencer, capture).unwrap().contract;

        let signature = signed.influencer_signature().unwrap();
        assert_eq!(signature.signed_at, expected_at);
        assert_eq!(signature.payload, vec![7, 8, 0xff]);
        assert!(verify_signature(signature));
    }

    #[test]
    fn test_status_matches_projection_after_every_step() {
        let mut current = contract();
        for party in [Party::Influencer, Party::Brand] {
            current = sign(&current, party, ink(1)).unwrap().contract;
            assert_eq!(
                current.status(),
                ContractStatus::from_signatures(
                    current.brand_signature().is_some(),
                    current.influencer_signature().is_some()
                )
            );
        }
    }

    #[test]
    fn test_input_contract_is_untouched() {
        let pending = contract();
        let _ = sign(&pending, Party::Brand, ink(1)).unwrap();
        assert_eq!(pending.status(), ContractStatus::Pending);
    }
}
