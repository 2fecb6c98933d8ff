//! Booking pricing and slot-allocation engine for RentKit.
//!
//! The site frontend calls this service over HTTP/JSON for price
//! computation, availability checks, checkout slot-holds and the staff
//! review flow. Payment capture and notification delivery stay with
//! their own collaborators; this engine only consumes the payment
//! confirmation signal and emits structured events.

pub mod booking;
pub mod cache;
pub mod error;
pub mod pricing;

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use sqlx::PgPool;

use booking::events::Notifier;
use cache::{AppCache, CacheStats};
use pricing::PricingPolicy;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
    pub policy: Arc<PricingPolicy>,
    pub notifier: Arc<dyn Notifier>,
}

/// Cache statistics endpoint for monitoring
async fn cache_stats(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

/// Build the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(pricing::routes::router())
        .merge(booking::routes::router())
        .route("/api/cache/stats", get(cache_stats))
        .with_state(state)
}
