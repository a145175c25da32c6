//! Error types for Pactflow

use thiserror::Error;

use crate::contract::Party;

/// Main error type for Pactflow
#[derive(Error, Debug)]
pub enum PactError {
    // Input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Contract lifecycle errors
    #[error("Contract {contract_id} already signed by {party}")]
    DuplicateSignature { contract_id: String, party: Party },

    #[error("Contract not found: {0}")]
    ContractNotFound(String),

    #[error("Contract already exists: {0}")]
    ContractAlreadyExists(String),

    // Storage errors
    #[error("Storage conflict on contract {contract_id}: expected version {expected}, found {found}")]
    StorageConflict {
        contract_id: String,
        expected: u64,
        found: u64,
    },

    // Outreach errors
    #[error("Outreach delivery failed: {0}")]
    Delivery(String),

    // Configuration errors
    #[error("Invalid configuration value for {var}: {reason}")]
    InvalidConfig { var: String, reason: String },

    // General errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PactError {
    /// Whether the caller may retry the operation that produced this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, PactError::StorageConflict { .. })
    }
}

/// Result type alias for Pactflow operations
pub type Result<T> = std::result::Result<T, PactError>;
