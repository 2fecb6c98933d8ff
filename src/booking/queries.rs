//! Database queries for holds, bookings and reservation requests.
//!
//! The overlap predicate is always `start < $end AND end > $start`
//! (half-open windows). Expired holds are filtered out in SQL so they
//! stop counting against availability the moment their TTL elapses,
//! independent of the background sweep.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;

use super::models::{Booking, BookingWindow, Hold, ReservationRequest, Resource};

/// Get a resource by id
pub async fn get_resource(conn: &mut PgConnection, resource_id: Uuid) -> Result<Option<Resource>> {
    let resource = sqlx::query_as::<_, Resource>(
        r#"
        SELECT id, name, unit_count
        FROM resources
        WHERE id = $1
        "#,
    )
    .bind(resource_id)
    .fetch_optional(conn)
    .await?;

    Ok(resource)
}

/// Count confirmed bookings overlapping the window
pub async fn count_overlapping_bookings(
    conn: &mut PgConnection,
    resource_id: Uuid,
    window: &BookingWindow,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM bookings
        WHERE resource_id = $1
          AND window_start < $3
          AND window_end > $2
        "#,
    )
    .bind(resource_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Count unexpired holds overlapping the window
pub async fn count_active_overlapping_holds(
    conn: &mut PgConnection,
    resource_id: Uuid,
    window: &BookingWindow,
    now: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM slot_holds
        WHERE resource_id = $1
          AND window_start < $3
          AND window_end > $2
          AND expires_at > $4
        "#,
    )
    .bind(resource_id)
    .bind(window.start)
    .bind(window.end)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Take the per-resource advisory lock for the current transaction.
///
/// Serializes all hold creation for one resource store-side; callers for
/// different resources proceed in parallel. Released automatically at
/// commit or rollback.
pub async fn lock_resource(conn: &mut PgConnection, resource_id: Uuid) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
        .bind(resource_id.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

/// Insert a hold row. Only called after the in-transaction overlap
/// re-check has passed.
pub async fn insert_hold(
    conn: &mut PgConnection,
    resource_id: Uuid,
    window: &BookingWindow,
    owner_token: &str,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<Hold> {
    let hold = sqlx::query_as::<_, Hold>(
        r#"
        INSERT INTO slot_holds (id, resource_id, window_start, window_end, owner_token, created_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, resource_id, window_start, window_end, owner_token, created_at, expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resource_id)
    .bind(window.start)
    .bind(window.end)
    .bind(owner_token)
    .bind(now)
    .bind(expires_at)
    .fetch_one(conn)
    .await?;

    Ok(hold)
}

/// Fetch a hold with a row lock, so promotion and release serialize
pub async fn get_hold_for_update(conn: &mut PgConnection, hold_id: Uuid) -> Result<Option<Hold>> {
    let hold = sqlx::query_as::<_, Hold>(
        r#"
        SELECT id, resource_id, window_start, window_end, owner_token, created_at, expires_at
        FROM slot_holds
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(hold_id)
    .fetch_optional(conn)
    .await?;

    Ok(hold)
}

/// Delete a hold row; returns how many rows went away
pub async fn delete_hold(conn: &mut PgConnection, hold_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM slot_holds WHERE id = $1")
        .bind(hold_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Insert a confirmed booking. Only ever called while promoting a hold,
/// inside the same transaction that deletes it.
pub async fn insert_booking(
    conn: &mut PgConnection,
    resource_id: Uuid,
    window: &BookingWindow,
    price_breakdown: &serde_json::Value,
    payment_ref: &str,
    customer_name: &str,
    customer_email: &str,
    now: DateTime<Utc>,
) -> Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (id, resource_id, window_start, window_end, price_breakdown, payment_ref, customer_name, customer_email, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id, resource_id, window_start, window_end, price_breakdown, payment_ref, customer_name, customer_email, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(resource_id)
    .bind(window.start)
    .bind(window.end)
    .bind(price_breakdown)
    .bind(payment_ref)
    .bind(customer_name)
    .bind(customer_email)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(booking)
}

/// Delete stale hold rows (background sweep)
pub async fn delete_expired_holds(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM slot_holds WHERE expires_at <= $1")
        .bind(now)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Create a staff-review reservation request. The event payload is set
/// once here and never edited afterwards.
pub async fn insert_reservation_request(
    pool: &PgPool,
    pack_key: &str,
    customer_name: &str,
    customer_email: &str,
    event_payload: &serde_json::Value,
    now: DateTime<Utc>,
) -> Result<ReservationRequest> {
    let request = sqlx::query_as::<_, ReservationRequest>(
        r#"
        INSERT INTO reservation_requests (id, pack_key, status, customer_name, customer_email, event_payload, created_at)
        VALUES ($1, $2, 'new', $3, $4, $5, $6)
        RETURNING
            id, pack_key, status, customer_name, customer_email, event_payload,
            rejection_reason, admin_notes, admin_flags, customer_message,
            price_total, deposit_amount, adjusted_items, created_at, decided_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(pack_key)
    .bind(customer_name)
    .bind(customer_email)
    .bind(event_payload)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(request)
}

/// Get a reservation request by id
pub async fn get_reservation_request(
    pool: &PgPool,
    request_id: Uuid,
) -> Result<Option<ReservationRequest>> {
    let request = sqlx::query_as::<_, ReservationRequest>(
        r#"
        SELECT
            id, pack_key, status, customer_name, customer_email, event_payload,
            rejection_reason, admin_notes, admin_flags, customer_message,
            price_total, deposit_amount, adjusted_items, created_at, decided_at
        FROM reservation_requests
        WHERE id = $1
        "#,
    )
    .bind(request_id)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Approve a pending request.
///
/// The status guard makes the transition a single conditional write:
/// zero rows back on an existing request means someone else decided it
/// first, which callers surface as `AlreadyDecided`.
pub async fn approve_request(
    pool: &PgPool,
    request_id: Uuid,
    price_total: Decimal,
    deposit_amount: Decimal,
    adjusted_items: Option<&serde_json::Value>,
    admin_notes: Option<&str>,
    admin_flags: Option<&serde_json::Value>,
    now: DateTime<Utc>,
) -> Result<Option<ReservationRequest>> {
    let request = sqlx::query_as::<_, ReservationRequest>(
        r#"
        UPDATE reservation_requests
        SET status = 'approved',
            price_total = $2,
            deposit_amount = $3,
            adjusted_items = COALESCE($4, adjusted_items),
            admin_notes = COALESCE($5, admin_notes),
            admin_flags = COALESCE($6, admin_flags),
            decided_at = $7
        WHERE id = $1
          AND status IN ('new', 'pending_review')
        RETURNING
            id, pack_key, status, customer_name, customer_email, event_payload,
            rejection_reason, admin_notes, admin_flags, customer_message,
            price_total, deposit_amount, adjusted_items, created_at, decided_at
        "#,
    )
    .bind(request_id)
    .bind(price_total)
    .bind(deposit_amount)
    .bind(adjusted_items)
    .bind(admin_notes)
    .bind(admin_flags)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Adjust a pending request with a new price and item list.
///
/// `customer_message` and `admin_notes` are separate columns for
/// separate audiences and are never merged.
pub async fn adjust_request(
    pool: &PgPool,
    request_id: Uuid,
    price_total: Decimal,
    deposit_amount: Decimal,
    adjusted_items: &serde_json::Value,
    customer_message: &str,
    admin_notes: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<ReservationRequest>> {
    let request = sqlx::query_as::<_, ReservationRequest>(
        r#"
        UPDATE reservation_requests
        SET status = 'adjusted',
            price_total = $2,
            deposit_amount = $3,
            adjusted_items = $4,
            customer_message = $5,
            admin_notes = COALESCE($6, admin_notes),
            decided_at = $7
        WHERE id = $1
          AND status IN ('new', 'pending_review')
        RETURNING
            id, pack_key, status, customer_name, customer_email, event_payload,
            rejection_reason, admin_notes, admin_flags, customer_message,
            price_total, deposit_amount, adjusted_items, created_at, decided_at
        "#,
    )
    .bind(request_id)
    .bind(price_total)
    .bind(deposit_amount)
    .bind(adjusted_items)
    .bind(customer_message)
    .bind(admin_notes)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}

/// Reject a pending request. No price fields are stored.
pub async fn reject_request(
    pool: &PgPool,
    request_id: Uuid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<Option<ReservationRequest>> {
    let request = sqlx::query_as::<_, ReservationRequest>(
        r#"
        UPDATE reservation_requests
        SET status = 'rejected',
            rejection_reason = $2,
            decided_at = $3
        WHERE id = $1
          AND status IN ('new', 'pending_review')
        RETURNING
            id, pack_key, status, customer_name, customer_email, event_payload,
            rejection_reason, admin_notes, admin_flags, customer_message,
            price_total, deposit_amount, adjusted_items, created_at, decided_at
        "#,
    )
    .bind(request_id)
    .bind(reason)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(request)
}
