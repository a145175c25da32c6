//! Outreach delivery collaborators

use crate::error::{PactError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::message::OutreachMessage;

/// Acknowledgement returned by a sender
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    fn now() -> Self {
        Self {
            message_id: format!("msg_{:016x}", rand::random::<u64>()),
            sent_at: Utc::now(),
        }
    }
}

/// Delivers composed outreach messages.
///
/// The transport (SMTP relay, provider API) lives behind this trait and is
/// constructed by the caller.
pub trait OutreachSender: Send + Sync {
    fn send(&self, message: &OutreachMessage) -> Result<DeliveryReceipt>;
}

/// Sender that only logs the message
#[derive(Clone, Debug, Default)]
pub struct TracingSender {
    from: Option<String>,
}

impl TracingSender {
    pub fn new(from: Option<String>) -> Self {
        Self { from }
    }
}

impl OutreachSender for TracingSender {
    fn send(&self, message: &OutreachMessage) -> Result<DeliveryReceipt> {
        message.validate()?;
        let receipt = DeliveryReceipt::now();
        tracing::info!(
            message_id = %receipt.message_id,
            from = self.from.as_deref().unwrap_or("<unset>"),
            to = %message.recipient,
            subject = %message.subject,
            "Outreach message logged (not delivered)"
        );
        tracing::debug!(body = %message.body, "Outreach body");
        Ok(receipt)
    }
}

fn poisoned<T>(_: T) -> PactError {
    PactError::Internal("outbox lock poisoned".to_string())
}

/// Sender that keeps every message in memory
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<OutreachMessage>>,
    failure: Option<String>,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sender whose every delivery fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Messages delivered so far
    pub fn sent(&self) -> Result<Vec<OutreachMessage>> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .map_err(poisoned)
    }
}

impl OutreachSender for RecordingSender {
    fn send(&self, message: &OutreachMessage) -> Result<DeliveryReceipt> {
        message.validate()?;
        if let Some(reason) = &self.failure {
            return Err(PactError::Delivery(reason.clone()));
        }
        self.sent
            .lock()
            .map_err(poisoned)?
            .push(message.clone());
        Ok(DeliveryReceipt::now())
    }
}
