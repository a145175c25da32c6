//! Content fingerprints for contracts and captured signatures

pub mod fingerprint;

pub use fingerprint::{contract_hash, signature_digest, verify_signature};
