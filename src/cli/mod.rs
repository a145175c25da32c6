//! CLI module for Pactflow

pub mod app;
pub mod commands;

pub use app::{
    contract_summary, DeliveryFailure, DispatchReport, PactApp, QuotationReply, SignReply,
};
pub use commands::{Cli, Commands, ContractAction, MetricsArgs};
