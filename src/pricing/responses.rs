//! Response DTOs for pricing API endpoints.

use serde::Serialize;

use super::calculators::{PriceBreakdown, PriceOutcome, QuoteReason};
use super::zones::Zone;

/// Outcome of a price computation.
///
/// `quote_required` is a success response, not an error: the booking is
/// viable but needs manual pricing by staff.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QuoteResponse {
    Priced { breakdown: PriceBreakdown },
    QuoteRequired { reason: QuoteReason },
}

impl From<PriceOutcome> for QuoteResponse {
    fn from(outcome: PriceOutcome) -> Self {
        match outcome {
            PriceOutcome::Priced(breakdown) => QuoteResponse::Priced { breakdown },
            PriceOutcome::QuoteRequired { reason } => QuoteResponse::QuoteRequired { reason },
        }
    }
}

/// Response for zone resolution
#[derive(Debug, Serialize)]
pub struct ZoneResponse {
    pub postal_code: String,
    pub zone: Zone,
}
