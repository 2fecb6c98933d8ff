//! Booking route handlers

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::AppState;

use super::availability::{self, Availability};
use super::holds;
use super::models::{Booking, Hold, ReservationRequest};
use super::queries;
use super::requests::{
    AdjustRequestBody, ApproveRequestBody, AvailabilityQuery, CreateHoldRequest,
    CreateReservationRequest, PromoteHoldRequest, RejectRequestBody,
};
use super::review::{self, ReviewAction};

/// Remaining capacity for a resource over a window
pub async fn check_availability(
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Availability>> {
    let result = availability::check_availability(&state.db, resource_id, &query.window()).await?;
    Ok(Json(result))
}

/// Create an exclusive hold for checkout
pub async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<Json<Hold>> {
    let hold = holds::create_hold(
        &state.db,
        state.notifier.as_ref(),
        req.resource_id,
        &req.window,
        &req.owner_token,
        req.ttl_secs,
    )
    .await?;
    Ok(Json(hold))
}

/// Promote a hold into a confirmed booking after payment confirmation
pub async fn promote_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<Uuid>,
    Json(req): Json<PromoteHoldRequest>,
) -> Result<Json<Booking>> {
    let booking = holds::promote_hold(
        &state.db,
        state.notifier.as_ref(),
        hold_id,
        &req.payment_ref,
        &req.price_breakdown,
        &req.customer_name,
        &req.customer_email,
    )
    .await?;
    Ok(Json(booking))
}

/// Idempotent release of a hold (payment abandoned)
#[derive(Debug, Serialize)]
pub struct ReleasedResponse {
    pub released: bool,
}

pub async fn release_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<Uuid>,
) -> Result<Json<ReleasedResponse>> {
    holds::release_hold(&state.db, hold_id).await?;
    Ok(Json(ReleasedResponse { released: true }))
}

/// Create a staff-review reservation request
pub async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<CreateReservationRequest>,
) -> Result<Json<ReservationRequest>> {
    let request = queries::insert_reservation_request(
        &state.db,
        &req.pack_key,
        &req.customer_name,
        &req.customer_email,
        &req.event_payload,
        Utc::now(),
    )
    .await?;
    Ok(Json(request))
}

/// Fetch a reservation request
pub async fn get_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ReservationRequest>> {
    let request = queries::get_reservation_request(&state.db, request_id)
        .await?
        .ok_or(crate::error::AppError::NotFound)?;
    Ok(Json(request))
}

pub async fn approve_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<ApproveRequestBody>,
) -> Result<Json<ReservationRequest>> {
    let action = ReviewAction::Approve {
        price_override: body.price_override,
        item_override: body.item_override,
        admin_notes: body.admin_notes,
        admin_flags: body.admin_flags,
    };
    transition(&state, request_id, action).await
}

pub async fn adjust_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<AdjustRequestBody>,
) -> Result<Json<ReservationRequest>> {
    let action = ReviewAction::Adjust {
        new_price: body.new_price,
        new_items: body.new_items,
        customer_message: body.customer_message,
        admin_notes: body.admin_notes,
    };
    transition(&state, request_id, action).await
}

pub async fn reject_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<RejectRequestBody>,
) -> Result<Json<ReservationRequest>> {
    transition(&state, request_id, ReviewAction::Reject { reason: body.reason }).await
}

async fn transition(
    state: &AppState,
    request_id: Uuid,
    action: ReviewAction,
) -> Result<Json<ReservationRequest>> {
    let updated = review::transition_request(
        &state.db,
        &state.cache,
        &state.policy,
        state.notifier.as_ref(),
        request_id,
        action,
    )
    .await?;
    Ok(Json(updated))
}

/// Booking API routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/availability/:resource_id", get(check_availability))
        .route("/api/holds", post(create_hold))
        .route("/api/holds/:hold_id/promote", post(promote_hold))
        .route("/api/holds/:hold_id", delete(release_hold))
        .route("/api/requests", post(create_request))
        .route("/api/requests/:request_id", get(get_request))
        .route("/api/requests/:request_id/approve", post(approve_request))
        .route("/api/requests/:request_id/adjust", post(adjust_request))
        .route("/api/requests/:request_id/reject", post(reject_request))
}
