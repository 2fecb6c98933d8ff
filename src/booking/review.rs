//! Staff review state machine for reservation requests.
//!
//! NEW and PENDING_REVIEW both mean "awaiting staff action"; APPROVED,
//! ADJUSTED and REJECTED are terminal. A transition is one conditional
//! status-guarded write, so concurrent decisions never clobber each
//! other: the loser gets `AlreadyDecided`, never a silent overwrite.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::AppCache;
use crate::error::{AppError, Result};
use crate::pricing::{self, round_money, PriceOutcome, PricingPolicy, QuoteSpec};

use super::events::{BookingEvent, Notifier};
use super::models::ReservationRequest;
use super::queries;

/// A staff decision on a pending request
#[derive(Debug, Clone)]
pub enum ReviewAction {
    /// Accept as-is. Price is recomputed server-side unless explicitly
    /// overridden. Notes and flags are advisory, admin-only, and never
    /// feed back into pricing.
    Approve {
        price_override: Option<Decimal>,
        item_override: Option<serde_json::Value>,
        admin_notes: Option<String>,
        admin_flags: Option<serde_json::Value>,
    },
    /// Counter-offer with a changed price/item list. The customer-visible
    /// message is mandatory - that is what distinguishes an adjustment
    /// from a silent approval.
    Adjust {
        new_price: Decimal,
        new_items: serde_json::Value,
        customer_message: String,
        admin_notes: Option<String>,
    },
    /// Decline with a mandatory reason. No price fields are stored.
    Reject { reason: String },
}

/// Reject malformed actions before any I/O or state mutation
pub fn validate_action(action: &ReviewAction) -> Result<()> {
    match action {
        ReviewAction::Approve { price_override, .. } => {
            if let Some(price) = price_override {
                if *price <= Decimal::ZERO {
                    return Err(AppError::InvalidInput(format!(
                        "price override must be positive, got {}",
                        price
                    )));
                }
            }
            Ok(())
        }
        ReviewAction::Adjust { new_price, customer_message, .. } => {
            if customer_message.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "adjustment requires a customer-visible message".to_string(),
                ));
            }
            if *new_price <= Decimal::ZERO {
                return Err(AppError::InvalidInput(format!(
                    "adjusted price must be positive, got {}",
                    new_price
                )));
            }
            Ok(())
        }
        ReviewAction::Reject { reason } => {
            if reason.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "rejection requires a reason".to_string(),
                ));
            }
            Ok(())
        }
    }
}

/// Recompute the request's price from its stored payload.
///
/// Client-supplied prices are never trusted; every approval re-derives
/// the total server-side unless staff explicitly override it.
async fn recompute_price(
    pool: &PgPool,
    cache: &AppCache,
    policy: &PricingPolicy,
    request: &ReservationRequest,
) -> Result<Decimal> {
    let details = request
        .event_details()
        .map_err(AppError::InvalidInput)?;

    let spec = QuoteSpec {
        pack_key: request.pack_key.clone(),
        party_size: details.party_size,
        postal_code: details.postal_code,
        zone_override: None,
        window: details.window,
        addons: vec![],
    };

    match pricing::compute_price(pool, cache, policy, &spec, None).await? {
        PriceOutcome::Priced(breakdown) => Ok(breakdown.grand_total),
        PriceOutcome::QuoteRequired { .. } => Err(AppError::InvalidInput(
            "request cannot be auto-priced; approve with an explicit price override".to_string(),
        )),
    }
}

/// Apply a staff decision to a pending request.
///
/// Returns the updated request, or `AlreadyDecided` when another staff
/// member reached a terminal state first.
pub async fn transition_request(
    pool: &PgPool,
    cache: &AppCache,
    policy: &PricingPolicy,
    notifier: &dyn Notifier,
    request_id: Uuid,
    action: ReviewAction,
) -> Result<ReservationRequest> {
    validate_action(&action)?;

    let request = queries::get_reservation_request(pool, request_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if request.status().map(|s| s.is_terminal()).unwrap_or(false) {
        return Err(AppError::AlreadyDecided);
    }

    let now = chrono::Utc::now();

    let updated = match &action {
        ReviewAction::Approve {
            price_override,
            item_override,
            admin_notes,
            admin_flags,
        } => {
            let price_total = match price_override {
                Some(price) => *price,
                None => recompute_price(pool, cache, policy, &request).await?,
            };
            let deposit = round_money(price_total * policy.deposit_rate, 0);

            queries::approve_request(
                pool,
                request_id,
                price_total,
                deposit,
                item_override.as_ref(),
                admin_notes.as_deref(),
                admin_flags.as_ref(),
                now,
            )
            .await?
        }
        ReviewAction::Adjust {
            new_price,
            new_items,
            customer_message,
            admin_notes,
        } => {
            let deposit = round_money(*new_price * policy.deposit_rate, 0);

            queries::adjust_request(
                pool,
                request_id,
                *new_price,
                deposit,
                new_items,
                customer_message,
                admin_notes.as_deref(),
                now,
            )
            .await?
        }
        ReviewAction::Reject { reason } => {
            queries::reject_request(pool, request_id, reason, now).await?
        }
    };

    // The row existed above, so zero rows updated means a concurrent
    // decision won the race.
    let updated = updated.ok_or(AppError::AlreadyDecided)?;

    let event = match &action {
        ReviewAction::Approve { .. } => BookingEvent::RequestApproved {
            request_id,
            price_total: updated.price_total.unwrap_or(Decimal::ZERO),
        },
        ReviewAction::Adjust { .. } => BookingEvent::RequestAdjusted {
            request_id,
            price_total: updated.price_total.unwrap_or(Decimal::ZERO),
        },
        ReviewAction::Reject { .. } => BookingEvent::RequestRejected { request_id },
    };
    notifier.notify(event);

    Ok(updated)
}
