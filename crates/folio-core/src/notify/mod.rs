//! Delivery of rendered notifications.

mod outbox;

pub use outbox::OutboxTransport;

use tracing::info;

use crate::error::TransportError;
use crate::expiration::NotificationPayload;

/// Result type for transports.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Hands a rendered message to a delivery channel.
pub trait NotificationTransport {
    fn deliver(&self, payload: &NotificationPayload) -> Result<()>;
}

impl<T: NotificationTransport + ?Sized> NotificationTransport for &T {
    fn deliver(&self, payload: &NotificationPayload) -> Result<()> {
        (**self).deliver(payload)
    }
}

impl<T: NotificationTransport + ?Sized> NotificationTransport for Box<T> {
    fn deliver(&self, payload: &NotificationPayload) -> Result<()> {
        (**self).deliver(payload)
    }
}

/// Writes each message to the log instead of sending it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

impl NotificationTransport for LogTransport {
    fn deliver(&self, payload: &NotificationPayload) -> Result<()> {
        info!(
            record = %payload.record_id,
            recipient = %payload.recipient,
            tier = %payload.tier,
            "{}",
            payload.subject
        );
        Ok(())
    }
}
