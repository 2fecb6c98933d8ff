//! Pricing service functions with database access.
//!
//! These functions validate input, load catalog data through the cache,
//! and delegate the actual math to the pure calculators. Price is only
//! ever computed server-side; client-supplied prices are never trusted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::cache::AppCache;
use crate::error::{AppError, Result};

use super::calculators::{price_quote, AddonSelection, PriceOutcome, QuoteInputs, TierSpec};
use super::models::PackDetail;
use super::policy::PricingPolicy;
use super::queries;
use super::zones::{resolve_zone, Zone};
use crate::booking::models::BookingWindow;

/// A selected add-on by catalog key
#[derive(Debug, Clone)]
pub struct AddonChoice {
    pub key: String,
    pub quantity: i32,
}

/// Validated service-level input for a price computation
#[derive(Debug, Clone)]
pub struct QuoteSpec {
    pub pack_key: String,
    pub party_size: Option<i32>,
    pub postal_code: Option<String>,
    /// Explicit zone override; wins over the postal-code derivation
    pub zone_override: Option<Zone>,
    pub window: BookingWindow,
    pub addons: Vec<AddonChoice>,
}

/// Reject malformed input before any I/O happens
fn validate_spec(spec: &QuoteSpec) -> Result<()> {
    spec.window
        .validate()
        .map_err(AppError::InvalidInput)?;

    if let Some(size) = spec.party_size {
        if size <= 0 {
            return Err(AppError::InvalidInput(format!(
                "party size must be positive, got {}",
                size
            )));
        }
    }

    for addon in &spec.addons {
        if addon.quantity < 0 {
            return Err(AppError::InvalidInput(format!(
                "add-on '{}' has negative quantity",
                addon.key
            )));
        }
    }

    Ok(())
}

/// Determine the delivery zone for a quote.
///
/// No postal code and no override means the customer collects the
/// equipment themselves.
fn effective_zone(policy: &PricingPolicy, spec: &QuoteSpec) -> Zone {
    match (&spec.postal_code, spec.zone_override) {
        (_, Some(zone)) => zone,
        (Some(code), None) => resolve_zone(&policy.zone_rules, code, None),
        (None, None) => Zone::PickupOnly,
    }
}

/// Load a pack through the cache, falling back to the database
async fn load_pack(pool: &PgPool, cache: &AppCache, key: &str) -> Result<Arc<PackDetail>> {
    if let Some(cached) = cache.packs.get(key).await {
        return Ok(cached);
    }

    let detail = queries::get_pack_detail(pool, key)
        .await?
        .ok_or(AppError::NotFound)?;

    let detail = Arc::new(detail);
    cache.packs.insert(key.to_string(), detail.clone()).await;

    Ok(detail)
}

/// Resolve the requested add-on keys against the pack catalog
fn resolve_addons(pack: &PackDetail, choices: &[AddonChoice]) -> Result<Vec<AddonSelection>> {
    choices
        .iter()
        .map(|choice| {
            let addon = pack.addon_by_key(&choice.key).ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "unknown add-on '{}' for pack '{}'",
                    choice.key, pack.pack.key
                ))
            })?;
            Ok(AddonSelection {
                key: addon.key.clone(),
                name: addon.name.clone(),
                unit_price: addon.unit_price,
                quantity: choice.quantity,
            })
        })
        .collect()
}

/// Compute an itemized price for a quote spec.
///
/// `as_of` pins the urgency evaluation clock; identical inputs with the
/// same `as_of` always produce identical breakdowns.
pub async fn compute_price(
    pool: &PgPool,
    cache: &AppCache,
    policy: &PricingPolicy,
    spec: &QuoteSpec,
    as_of: Option<DateTime<Utc>>,
) -> Result<PriceOutcome> {
    validate_spec(spec)?;

    let now = as_of.unwrap_or_else(Utc::now);
    let pack = load_pack(pool, cache, &spec.pack_key).await?;
    let zone = effective_zone(policy, spec);
    let addons = resolve_addons(&pack, &spec.addons)?;

    let tiers: Vec<TierSpec> = pack
        .tiers
        .iter()
        .map(|t| TierSpec {
            label: t.label.clone(),
            capacity: t.capacity,
            price_delta: t.price_delta,
            items: t.item_names(),
        })
        .collect();

    let inputs = QuoteInputs {
        pack_key: &pack.pack.key,
        base_price: pack.pack.base_price,
        currency: &pack.pack.currency,
        tiers: &tiers,
        party_size: spec.party_size,
        zone,
        window: &spec.window,
        addons: &addons,
    };

    Ok(price_quote(&inputs, policy, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::pricing::models::{Pack, PackAddon};

    fn spec() -> QuoteSpec {
        QuoteSpec {
            pack_key: "sound-pack".to_string(),
            party_size: Some(50),
            postal_code: Some("10234".to_string()),
            zone_override: None,
            window: BookingWindow {
                start: "2026-06-20T10:00:00Z".parse().unwrap(),
                end: "2026-06-20T18:00:00Z".parse().unwrap(),
            },
            addons: vec![],
        }
    }

    fn pack_detail() -> PackDetail {
        let pack_id = Uuid::new_v4();
        PackDetail {
            pack: Pack {
                id: pack_id,
                key: "sound-pack".to_string(),
                name: "Sound pack".to_string(),
                base_price: dec!(300),
                currency: "EUR".to_string(),
                active: true,
                deleted_at: None,
            },
            tiers: vec![],
            addons: vec![PackAddon {
                id: Uuid::new_v4(),
                pack_id,
                key: "mic".to_string(),
                name: "Wireless microphone".to_string(),
                unit_price: dec!(25),
            }],
        }
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut s = spec();
        s.window.end = s.window.start;
        assert!(matches!(validate_spec(&s), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_party_size() {
        let mut s = spec();
        s.party_size = Some(0);
        assert!(matches!(validate_spec(&s), Err(AppError::InvalidInput(_))));
        s.party_size = Some(-3);
        assert!(matches!(validate_spec(&s), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_effective_zone_override_wins() {
        let policy = PricingPolicy::default();
        let mut s = spec();
        s.zone_override = Some(Zone::OuterRing);
        assert_eq!(effective_zone(&policy, &s), Zone::OuterRing);
    }

    #[test]
    fn test_effective_zone_derived_from_postal_code() {
        let policy = PricingPolicy::default();
        assert_eq!(effective_zone(&policy, &spec()), Zone::SameCity);
    }

    #[test]
    fn test_effective_zone_no_address_means_pickup() {
        let policy = PricingPolicy::default();
        let mut s = spec();
        s.postal_code = None;
        assert_eq!(effective_zone(&policy, &s), Zone::PickupOnly);
    }

    #[test]
    fn test_resolve_addons_unknown_key_is_invalid_input() {
        let pack = pack_detail();
        let choices = vec![AddonChoice { key: "laser-show".to_string(), quantity: 1 }];
        assert!(matches!(
            resolve_addons(&pack, &choices),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_resolve_addons_maps_catalog_prices() {
        let pack = pack_detail();
        let choices = vec![AddonChoice { key: "mic".to_string(), quantity: 2 }];
        let resolved = resolve_addons(&pack, &choices).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].unit_price, dec!(25));
        assert_eq!(resolved[0].quantity, 2);
    }
}
