//! Availability checking.
//!
//! Read-only: counts confirmed bookings plus unexpired holds overlapping
//! the requested window against the resource's unit capacity. Store
//! errors propagate unchanged; a transient read failure is never
//! reported as "unavailable".

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::models::BookingWindow;
use super::queries;

/// Remaining capacity for a resource over a window
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub available: bool,
    pub remaining: i32,
    pub capacity: i32,
}

/// Units left after subtracting occupied ones, floored at zero
pub fn remaining_units(capacity: i32, occupied: i64) -> i32 {
    (i64::from(capacity) - occupied).max(0) as i32
}

/// Check how many units of a resource remain free over a window
pub async fn check_availability(
    pool: &PgPool,
    resource_id: Uuid,
    window: &BookingWindow,
) -> Result<Availability> {
    window.validate().map_err(AppError::InvalidInput)?;

    let now = Utc::now();
    let mut conn = pool.acquire().await?;

    let resource = queries::get_resource(&mut *conn, resource_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let booked = queries::count_overlapping_bookings(&mut *conn, resource_id, window).await?;
    let held = queries::count_active_overlapping_holds(&mut *conn, resource_id, window, now).await?;

    let remaining = remaining_units(resource.unit_count, booked + held);

    Ok(Availability {
        available: remaining > 0,
        remaining,
        capacity: resource.unit_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_units_subtracts_occupied() {
        assert_eq!(remaining_units(1, 0), 1);
        assert_eq!(remaining_units(1, 1), 0);
        assert_eq!(remaining_units(3, 2), 1);
    }

    #[test]
    fn test_remaining_units_floors_at_zero() {
        // Lazy expiry can briefly leave more rows than capacity
        assert_eq!(remaining_units(1, 2), 0);
        assert_eq!(remaining_units(0, 0), 0);
    }
}
