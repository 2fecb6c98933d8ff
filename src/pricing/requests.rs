//! Request DTOs for pricing API endpoints.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::booking::models::BookingWindow;

use super::zones::Zone;

/// Request to compute an itemized price
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub pack_key: String,
    #[serde(default)]
    pub party_size: Option<i32>,
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Explicit zone override (staff use); wins over the postal code
    #[serde(default)]
    pub zone: Option<Zone>,
    pub window: BookingWindow,
    #[serde(default)]
    pub addons: Vec<AddonChoiceRequest>,
    /// Pins the urgency clock; defaults to the current time
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

/// A selected add-on in the request
#[derive(Debug, Deserialize)]
pub struct AddonChoiceRequest {
    pub key: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Query parameters for zone resolution
#[derive(Debug, Deserialize)]
pub struct ZoneQuery {
    pub postal_code: String,
    #[serde(default)]
    pub zone: Option<Zone>,
}
