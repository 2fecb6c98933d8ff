//! Pricing route handlers

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::Result;
use crate::AppState;

use super::requests::{QuoteRequest, ZoneQuery};
use super::responses::{QuoteResponse, ZoneResponse};
use super::services::{self, AddonChoice, QuoteSpec};
use super::zones::resolve_zone;

/// Compute an itemized price for a pack and window
pub async fn quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>> {
    let spec = QuoteSpec {
        pack_key: req.pack_key,
        party_size: req.party_size,
        postal_code: req.postal_code,
        zone_override: req.zone,
        window: req.window,
        addons: req
            .addons
            .into_iter()
            .map(|a| AddonChoice { key: a.key, quantity: a.quantity })
            .collect(),
    };

    let outcome =
        services::compute_price(&state.db, &state.cache, &state.policy, &spec, req.as_of).await?;

    Ok(Json(outcome.into()))
}

/// Resolve a postal code to a delivery zone
pub async fn zone(
    State(state): State<AppState>,
    Query(query): Query<ZoneQuery>,
) -> Json<ZoneResponse> {
    let zone = resolve_zone(&state.policy.zone_rules, &query.postal_code, query.zone);
    Json(ZoneResponse {
        postal_code: query.postal_code,
        zone,
    })
}

/// Pricing API routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pricing/quote", post(quote))
        .route("/api/pricing/zone", get(zone))
}
