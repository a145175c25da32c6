//! Outreach messages and the injected senders that deliver them

pub mod message;
pub mod sender;

pub use message::{decision_reply, fully_executed_notice, validate_recipient, OutreachMessage};
pub use sender::{DeliveryReceipt, OutreachSender, RecordingSender, TracingSender};
