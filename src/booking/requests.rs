//! Request DTOs for booking API endpoints.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::pricing::PriceBreakdown;

use super::models::BookingWindow;

/// Query parameters for an availability check
#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityQuery {
    pub fn window(&self) -> BookingWindow {
        BookingWindow {
            start: self.start,
            end: self.end,
        }
    }
}

/// Request to create a slot hold
#[derive(Debug, Deserialize)]
pub struct CreateHoldRequest {
    pub resource_id: Uuid,
    pub window: BookingWindow,
    pub owner_token: String,
    #[serde(default = "default_hold_ttl")]
    pub ttl_secs: i64,
}

fn default_hold_ttl() -> i64 {
    10 * 60
}

/// Request to promote a hold into a booking after payment confirmation
#[derive(Debug, Deserialize)]
pub struct PromoteHoldRequest {
    pub payment_ref: String,
    pub price_breakdown: PriceBreakdown,
    pub customer_name: String,
    pub customer_email: String,
}

/// Request to create a staff-review reservation request.
///
/// `event_payload` is opaque beyond the fields the engine reads
/// (party size, window, postal code); the rest passes through untouched.
#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub pack_key: String,
    pub customer_name: String,
    pub customer_email: String,
    pub event_payload: serde_json::Value,
}

/// Staff approval payload
#[derive(Debug, Deserialize)]
pub struct ApproveRequestBody {
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub price_override: Option<Decimal>,
    #[serde(default)]
    pub item_override: Option<serde_json::Value>,
    #[serde(default)]
    pub admin_notes: Option<String>,
    #[serde(default)]
    pub admin_flags: Option<serde_json::Value>,
}

/// Staff adjustment payload
#[derive(Debug, Deserialize)]
pub struct AdjustRequestBody {
    #[serde(with = "rust_decimal::serde::str")]
    pub new_price: Decimal,
    pub new_items: serde_json::Value,
    pub customer_message: String,
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Staff rejection payload
#[derive(Debug, Deserialize)]
pub struct RejectRequestBody {
    pub reason: String,
}
