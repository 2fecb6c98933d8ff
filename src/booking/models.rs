//! Database models for holds, bookings and reservation requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A half-open rental window; the unit of conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookingWindow {
    /// End must be strictly after start. Checked before any I/O.
    pub fn validate(&self) -> Result<(), String> {
        if self.end <= self.start {
            return Err(format!(
                "window end {} must be after start {}",
                self.end, self.start
            ));
        }
        Ok(())
    }

    /// Standard interval overlap test
    pub fn overlaps(&self, other: &BookingWindow) -> bool {
        other.start < self.end && other.end > self.start
    }

    /// Whether the rental runs into a later calendar day. Such windows
    /// already include next-day pickup, so no late-pickup surcharge.
    pub fn spans_extra_day(&self) -> bool {
        self.end.date_naive() > self.start.date_naive()
    }
}

/// Rentable resource from resources.
///
/// `unit_count` is 1 for a single physical kit; fleets of identical
/// units model higher capacity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Resource {
    pub id: Uuid,
    pub name: String,
    pub unit_count: i32,
}

/// Ephemeral slot hold from slot_holds
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Hold {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub owner_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hold {
    /// An expired hold no longer counts against availability
    pub fn is_active_at(&self, check_time: DateTime<Utc>) -> bool {
        self.expires_at > check_time
    }

    pub fn window(&self) -> BookingWindow {
        BookingWindow {
            start: self.window_start,
            end: self.window_end,
        }
    }
}

/// Confirmed booking from bookings. Only ever created by promoting a hold.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub price_breakdown: serde_json::Value,
    pub payment_ref: String,
    pub customer_name: String,
    pub customer_email: String,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a staff-reviewed request.
///
/// `New` and `PendingReview` are both "awaiting staff action"; the other
/// three are terminal. A decided request is never edited in place — a new
/// request is created for renegotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    New,
    PendingReview,
    Approved,
    Adjusted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::New => "new",
            RequestStatus::PendingReview => "pending_review",
            RequestStatus::Approved => "approved",
            RequestStatus::Adjusted => "adjusted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "new" => Some(RequestStatus::New),
            "pending_review" => Some(RequestStatus::PendingReview),
            "approved" => Some(RequestStatus::Approved),
            "adjusted" => Some(RequestStatus::Adjusted),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Approved | RequestStatus::Adjusted | RequestStatus::Rejected
        )
    }
}

/// Staff-reviewed booking proposal from reservation_requests.
///
/// `admin_notes` and `customer_message` are separate columns with
/// different visibility; the two audiences must never see each other's
/// content, so they are never merged into one field.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReservationRequest {
    pub id: Uuid,
    pub pack_key: String,
    pub status: String,
    pub customer_name: String,
    pub customer_email: String,
    pub event_payload: serde_json::Value,
    pub rejection_reason: Option<String>,
    pub admin_notes: Option<String>,
    pub admin_flags: Option<serde_json::Value>,
    pub customer_message: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub price_total: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub deposit_amount: Option<Decimal>,
    pub adjusted_items: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

/// The narrow slice of the event payload the engine actually reads.
/// Everything else in the payload passes through untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDetails {
    pub party_size: Option<i32>,
    pub window: BookingWindow,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl ReservationRequest {
    pub fn status(&self) -> Option<RequestStatus> {
        RequestStatus::parse(&self.status)
    }

    /// Parse only the fields pricing needs out of the opaque payload
    pub fn event_details(&self) -> Result<EventDetails, String> {
        serde_json::from_value(self.event_payload.clone())
            .map_err(|e| format!("malformed event payload: {}", e))
    }
}
