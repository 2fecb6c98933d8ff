//! Slot hold management.
//!
//! Turns "check availability, then create a hold" into one atomic
//! operation. The store is the single source of truth: every creation
//! re-checks overlaps inside the same transaction that inserts, behind a
//! per-resource advisory lock, so exactly one of N concurrent overlapping
//! calls succeeds. Expiry is enforced lazily in the overlap queries and
//! by a background sweep.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::time::Duration as StdDuration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::pricing::PriceBreakdown;

use super::events::{BookingEvent, Notifier};
use super::models::{Booking, BookingWindow, Hold};
use super::queries;

/// Holds longer than this are clamped; a hold is a checkout aid, not a
/// free reservation.
pub const MAX_HOLD_TTL_SECS: i64 = 30 * 60;

/// How often the sweep deletes stale hold rows
const SWEEP_INTERVAL_SECS: u64 = 60;

/// Decide the outcome of a hold attempt from the in-transaction counts.
///
/// A full slot with a confirmed booking consuming the last unit is
/// `SlotBooked` (terminal for the window); full only because of holds is
/// `SlotHeld` (retryable once they expire or release).
pub fn classify_conflict(booked: i64, held: i64, capacity: i32) -> Option<AppError> {
    let capacity = i64::from(capacity);
    if booked + held < capacity {
        None
    } else if booked >= capacity {
        Some(AppError::SlotBooked)
    } else {
        Some(AppError::SlotHeld)
    }
}

/// Create an exclusive short-lived hold on a resource window.
///
/// One transaction: advisory-lock the resource, re-validate overlaps
/// against the live store (never a prior snapshot), insert. Returns the
/// created hold with its expiry.
pub async fn create_hold(
    pool: &PgPool,
    notifier: &dyn Notifier,
    resource_id: Uuid,
    window: &BookingWindow,
    owner_token: &str,
    ttl_secs: i64,
) -> Result<Hold> {
    window.validate().map_err(AppError::InvalidInput)?;
    if owner_token.is_empty() {
        return Err(AppError::InvalidInput("owner token must not be empty".to_string()));
    }
    if ttl_secs <= 0 {
        return Err(AppError::InvalidInput(format!(
            "hold ttl must be positive, got {}s",
            ttl_secs
        )));
    }

    let ttl_secs = ttl_secs.min(MAX_HOLD_TTL_SECS);
    let now = Utc::now();
    let expires_at = now + Duration::seconds(ttl_secs);

    let mut tx = pool.begin().await?;

    queries::lock_resource(&mut *tx, resource_id).await?;

    let resource = queries::get_resource(&mut *tx, resource_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let booked = queries::count_overlapping_bookings(&mut *tx, resource_id, window).await?;
    let held = queries::count_active_overlapping_holds(&mut *tx, resource_id, window, now).await?;

    if let Some(conflict) = classify_conflict(booked, held, resource.unit_count) {
        // Dropping the transaction rolls back and releases the lock
        return Err(conflict);
    }

    let hold = queries::insert_hold(&mut *tx, resource_id, window, owner_token, now, expires_at).await?;

    tx.commit().await?;

    notifier.notify(BookingEvent::HoldCreated {
        hold_id: hold.id,
        resource_id,
        expires_at: hold.expires_at,
    });

    Ok(hold)
}

/// Promote an active hold into a confirmed booking after payment.
///
/// Fails closed with `HoldExpired` once the TTL has elapsed (or the
/// sweep already removed the row); the caller must restart from the
/// availability check. Delete-hold and insert-booking happen in the same
/// transaction, so the window is never momentarily free.
pub async fn promote_hold(
    pool: &PgPool,
    notifier: &dyn Notifier,
    hold_id: Uuid,
    payment_ref: &str,
    breakdown: &PriceBreakdown,
    customer_name: &str,
    customer_email: &str,
) -> Result<Booking> {
    if payment_ref.is_empty() {
        return Err(AppError::InvalidInput("payment reference must not be empty".to_string()));
    }

    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let hold = queries::get_hold_for_update(&mut *tx, hold_id)
        .await?
        .ok_or(AppError::HoldExpired)?;

    if !hold.is_active_at(now) {
        // Never silently re-extend an expired hold
        return Err(AppError::HoldExpired);
    }

    let window = hold.window();
    let breakdown_json = serde_json::to_value(breakdown)
        .map_err(|e| AppError::Internal(format!("failed to serialize price breakdown: {}", e)))?;

    queries::delete_hold(&mut *tx, hold_id).await?;
    let booking = queries::insert_booking(
        &mut *tx,
        hold.resource_id,
        &window,
        &breakdown_json,
        payment_ref,
        customer_name,
        customer_email,
        now,
    )
    .await?;

    tx.commit().await?;

    notifier.notify(BookingEvent::BookingConfirmed {
        booking_id: booking.id,
        resource_id: booking.resource_id,
        payment_ref: payment_ref.to_string(),
    });

    Ok(booking)
}

/// Release a hold early (payment abandoned).
///
/// Idempotent: releasing an already-released or expired hold is a no-op,
/// not an error.
pub async fn release_hold(pool: &PgPool, hold_id: Uuid) -> Result<()> {
    let mut conn = pool.acquire().await?;
    let removed = queries::delete_hold(&mut *conn, hold_id).await?;
    if removed > 0 {
        info!("Released hold {}", hold_id);
    }
    Ok(())
}

/// Background sweep deleting stale hold rows.
///
/// Lazy expiry in the overlap queries already keeps expired holds from
/// counting against availability; the sweep just keeps the table small.
pub async fn start_hold_sweeper(db: PgPool) {
    let mut interval = interval(StdDuration::from_secs(SWEEP_INTERVAL_SECS));
    loop {
        interval.tick().await;
        match queries::delete_expired_holds(&db, Utc::now()).await {
            Ok(0) => {}
            Ok(n) => info!("Swept {} expired holds", n),
            Err(e) => warn!("Hold sweep failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_conflict_free_capacity() {
        assert!(classify_conflict(0, 0, 1).is_none());
        assert!(classify_conflict(1, 1, 3).is_none());
    }

    #[test]
    fn test_classify_conflict_booked_wins_over_held() {
        // The confirmed booking is the stronger, non-retryable fact
        match classify_conflict(1, 0, 1) {
            Some(AppError::SlotBooked) => {}
            other => panic!("expected SlotBooked, got {:?}", other),
        }
        match classify_conflict(2, 1, 2) {
            Some(AppError::SlotBooked) => {}
            other => panic!("expected SlotBooked, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_conflict_held_is_retryable_outcome() {
        match classify_conflict(0, 1, 1) {
            Some(AppError::SlotHeld) => {}
            other => panic!("expected SlotHeld, got {:?}", other),
        }
        // Mixed occupancy, but at least one unit only held, not booked
        match classify_conflict(1, 1, 2) {
            Some(AppError::SlotHeld) => {}
            other => panic!("expected SlotHeld, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_conflict_multi_unit_fleet() {
        assert!(classify_conflict(2, 0, 3).is_none());
        match classify_conflict(3, 0, 3) {
            Some(AppError::SlotBooked) => {}
            other => panic!("expected SlotBooked, got {:?}", other),
        }
    }
}
