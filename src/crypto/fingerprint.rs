//! Contract content hashing and signature digests

use sha2::{Digest, Sha256};

use crate::contract::{ContractTerms, Signature};
use crate::types::Hash;

/// SHA-256 fingerprint of the negotiated terms, hex encoded.
///
/// Covers brand, creator, product, rate and timeline joined with `-`, so two
/// contracts with identical terms share a fingerprint. The rate is normalized
/// first, so `1200` and `1200.00` hash alike.
pub fn contract_hash(terms: &ContractTerms) -> String {
    let canonical = format!(
        "{}-{}-{}-{}-{}",
        terms.brand_id,
        terms.creator_id,
        terms.product,
        terms.rate.normalize(),
        terms.timeline
    );

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Blake2b digest of a captured signature image
pub fn signature_digest(payload: &[u8]) -> Hash {
    Hash::from_bytes(payload)
}

/// Check that a recorded signature still matches its digest
pub fn verify_signature(signature: &Signature) -> bool {
    signature_digest(&signature.payload) == signature.digest
}
