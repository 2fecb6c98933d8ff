//! Structured booking events.
//!
//! The engine emits events; formatting and delivery (email/SMS, staff
//! feeds) belong to the notification collaborator. The default sink just
//! logs, which keeps tests and local runs self-contained.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Event emitted at booking-flow decision points
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BookingEvent {
    HoldCreated {
        hold_id: Uuid,
        resource_id: Uuid,
        expires_at: chrono::DateTime<chrono::Utc>,
    },
    BookingConfirmed {
        booking_id: Uuid,
        resource_id: Uuid,
        payment_ref: String,
    },
    RequestApproved {
        request_id: Uuid,
        #[serde(with = "rust_decimal::serde::str")]
        price_total: Decimal,
    },
    RequestAdjusted {
        request_id: Uuid,
        #[serde(with = "rust_decimal::serde::str")]
        price_total: Decimal,
    },
    RequestRejected {
        request_id: Uuid,
    },
}

/// Outbound event sink
pub trait Notifier: Send + Sync {
    fn notify(&self, event: BookingEvent);
}

/// Default sink: structured log lines, no delivery
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, event: BookingEvent) {
        match serde_json::to_string(&event) {
            Ok(payload) => tracing::info!(target: "booking_events", "{}", payload),
            Err(e) => tracing::warn!("Failed to serialize booking event: {}", e),
        }
    }
}
