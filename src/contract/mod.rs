//! Contract lifecycle: two independent signatures drive a contract to fully signed

pub mod lifecycle;
pub mod manager;
pub mod store;
pub mod types;

pub use lifecycle::{sign, LifecycleEvent, SignOutcome};
pub use manager::ContractManager;
pub use store::{ContractStore, InMemoryContractStore, JsonFileContractStore};
pub use types::{
    Contract, ContractStatus, ContractTerms, Party, Signature, SignatureCapture,
};
