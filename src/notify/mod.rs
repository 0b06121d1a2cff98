//! Message delivery.
//!
//! Delivery is one POST with no retry. Callers treat a [`DeliveryError`] as
//! non-fatal.

pub mod telegram;

use std::future::Future;

use crate::error::DeliveryError;

pub use telegram::TelegramNotifier;

/// Acknowledgement from the chat API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub status: u16,
    pub message_id: Option<i64>,
}

pub trait Notifier {
    fn notify(&self, message: &str) -> impl Future<Output = Result<Ack, DeliveryError>> + Send;
}
