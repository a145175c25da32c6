//! Application configuration from environment variables

use crate::error::{PactError, Result};
use crate::negotiation::NegotiationPolicy;
use rust_decimal::Decimal;
use std::path::PathBuf;

pub const DEFAULT_STORE_PATH: &str = "pactflow-contracts.json";

/// Runtime configuration for the CLI and embedding applications
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub policy: NegotiationPolicy,
    pub max_sign_retries: u32,
    pub sender_email: Option<String>,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            policy: NegotiationPolicy::default(),
            max_sign_retries: 3,
            sender_email: None,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load `.env` if present, then read the process environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Read the process environment without touching `.env`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let ratio = |key: &str, default: Decimal| -> Result<Decimal> {
            let Some(raw) = value(key) else {
                return Ok(default);
            };
            let parsed: Decimal = raw.parse().map_err(|_| invalid(key, format!("not a number: {}", raw)))?;
            if parsed <= Decimal::ZERO || parsed > Decimal::ONE {
                return Err(invalid(key, format!("must be within (0, 1], got {}", parsed)));
            }
            Ok(parsed)
        };

        let policy = NegotiationPolicy {
            default_floor_ratio: ratio(
                "PACTFLOW_DEFAULT_FLOOR_RATIO",
                defaults.policy.default_floor_ratio,
            )?,
            counter_band_ratio: ratio(
                "PACTFLOW_COUNTER_BAND_RATIO",
                defaults.policy.counter_band_ratio,
            )?,
        };

        let max_sign_retries = match value("PACTFLOW_MAX_SIGN_RETRIES") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| invalid("PACTFLOW_MAX_SIGN_RETRIES", e.to_string()))?,
            None => defaults.max_sign_retries,
        };

        let sender_email = value("PACTFLOW_SENDER_EMAIL");
        if let Some(email) = &sender_email {
            if !email.contains('@') {
                return Err(invalid("PACTFLOW_SENDER_EMAIL", format!("not an address: {}", email)));
            }
        }

        Ok(Self {
            store_path: value("PACTFLOW_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.store_path),
            policy,
            max_sign_retries,
            sender_email,
            log_level: value("PACTFLOW_LOG").unwrap_or(defaults.log_level),
        })
    }
}

fn invalid(var: &str, reason: String) -> PactError {
    PactError::InvalidConfig {
        var: var.to_string(),
        reason,
    }
}
