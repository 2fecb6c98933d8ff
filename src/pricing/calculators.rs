//! Core pricing calculation functions.
//!
//! Pure functions for pricing math - no database access, no clock reads.
//! Evaluation time is always an explicit argument, so two calls with
//! identical inputs and the same `now` produce identical breakdowns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::booking::models::BookingWindow;

use super::policy::{PickupSurchargePolicy, PricingPolicy};
use super::zones::Zone;

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is
/// exactly halfway between two possibilities. This reduces cumulative
/// rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use rentkit_web::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// A capacity tier as pure calculator input
#[derive(Debug, Clone)]
pub struct TierSpec {
    pub label: String,
    pub capacity: i32,
    pub price_delta: Decimal,
    pub items: Vec<String>,
}

/// Result of tier selection for a party size. Derived, never persisted.
#[derive(Debug, Clone)]
pub struct TierAdjustment {
    pub label: String,
    pub capacity: i32,
    pub capacity_note: String,
    pub items: Vec<String>,
    /// Pack base price plus the tier's delta
    pub adjusted_price: Decimal,
    /// Whether this tier is above the smallest (drives installation fee)
    pub above_smallest: bool,
    /// Set when the party size exceeds every tier; pricing then needs a
    /// manual quote instead of the largest-tier fallback price
    pub needs_manual_quote: bool,
}

/// Select the smallest tier whose capacity covers the party size.
///
/// No party size defaults to the smallest tier. A size beyond every tier
/// falls back to the largest one, flagged for manual quoting.
pub fn select_tier(base_price: Decimal, tiers: &[TierSpec], party_size: Option<i32>) -> TierAdjustment {
    let mut sorted: Vec<&TierSpec> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.capacity);

    // A pack without tiers cannot be auto-priced
    if sorted.is_empty() {
        return TierAdjustment {
            label: String::new(),
            capacity: 0,
            capacity_note: String::new(),
            items: vec![],
            adjusted_price: base_price,
            above_smallest: false,
            needs_manual_quote: true,
        };
    }

    let (tier, index, needs_manual_quote) = match party_size {
        None => (sorted[0], 0, false),
        Some(size) => match sorted.iter().position(|t| t.capacity >= size) {
            Some(i) => (sorted[i], i, false),
            None => (sorted[sorted.len() - 1], sorted.len() - 1, true),
        },
    };

    TierAdjustment {
        label: tier.label.clone(),
        capacity: tier.capacity,
        capacity_note: format!("up to {} people", tier.capacity),
        items: tier.items.clone(),
        adjusted_price: base_price + tier.price_delta,
        above_smallest: index > 0,
        needs_manual_quote,
    }
}

/// A selected add-on as pure calculator input
#[derive(Debug, Clone)]
pub struct AddonSelection {
    pub key: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Sum of flat per-unit add-on prices. No quantity discount.
pub fn addon_total(addons: &[AddonSelection]) -> Decimal {
    addons
        .iter()
        .filter(|a| a.quantity > 0)
        .map(|a| a.unit_price * Decimal::from(a.quantity))
        .sum()
}

/// Whether the late-pickup surcharge applies.
///
/// Table rule, not a continuous function: the booking must end at or past
/// the configured cutoff, the customer must not be picking up themselves,
/// and the window must not already run into a later day (which includes
/// next-day pickup at no charge).
pub fn pickup_surcharge_applies(
    window: &BookingWindow,
    zone: Zone,
    policy: &PickupSurchargePolicy,
) -> bool {
    if zone == Zone::PickupOnly {
        return false;
    }
    if window.spans_extra_day() {
        return false;
    }
    window.end.time() >= policy.late_cutoff
}

/// Whether the booking start is close enough to `now` to carry the
/// urgency surcharge
pub fn is_urgent(start: DateTime<Utc>, now: DateTime<Utc>, window_hours: i64) -> bool {
    start - now < chrono::Duration::hours(window_hours)
}

/// Reason automatic pricing was not possible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteReason {
    /// Delivery address is outside all serviced zones
    OutOfRangeZone,
    /// Party size exceeds the largest tier of the pack
    PartySizeExceedsTiers,
}

/// Itemized price breakdown. The shape persisted onto bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub pack_key: String,
    pub tier_label: String,
    pub tier_capacity_note: String,
    pub items: Vec<String>,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub base_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub addon_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub delivery_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub installation_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub pickup_surcharge: Decimal,
    pub urgency_applied: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub grand_total: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub deposit: Decimal,
}

/// Outcome of a price computation. `QuoteRequired` is a result, not a
/// failure: the booking is viable but needs manual pricing by staff.
#[derive(Debug, Clone)]
pub enum PriceOutcome {
    Priced(PriceBreakdown),
    QuoteRequired { reason: QuoteReason },
}

/// Everything `price_quote` needs, resolved ahead of time
#[derive(Debug, Clone)]
pub struct QuoteInputs<'a> {
    pub pack_key: &'a str,
    pub base_price: Decimal,
    pub currency: &'a str,
    pub tiers: &'a [TierSpec],
    pub party_size: Option<i32>,
    pub zone: Zone,
    pub window: &'a BookingWindow,
    pub addons: &'a [AddonSelection],
}

/// Compute the full itemized breakdown.
///
/// Fee order is fixed: tier base, add-ons, delivery, installation,
/// late-pickup surcharge. The urgency multiplier is applied last, after
/// all additive fees, then the total is rounded to a whole currency unit.
/// Deposit is a policy fraction of the rounded grand total.
pub fn price_quote(
    inputs: &QuoteInputs<'_>,
    policy: &PricingPolicy,
    now: DateTime<Utc>,
) -> PriceOutcome {
    let tier = select_tier(inputs.base_price, inputs.tiers, inputs.party_size);
    if tier.needs_manual_quote {
        return PriceOutcome::QuoteRequired {
            reason: QuoteReason::PartySizeExceedsTiers,
        };
    }

    let addons = addon_total(inputs.addons);

    let delivery_fee = match policy.delivery_fee(inputs.zone) {
        Some(fee) => fee,
        None => {
            return PriceOutcome::QuoteRequired {
                reason: QuoteReason::OutOfRangeZone,
            }
        }
    };

    // Installation is automatic above the smallest tier, never optional
    let installation_fee = if tier.above_smallest {
        policy.installation_fee(&tier.label)
    } else {
        Decimal::ZERO
    };

    let pickup_surcharge = if pickup_surcharge_applies(inputs.window, inputs.zone, &policy.pickup_surcharge) {
        policy.pickup_surcharge.fee
    } else {
        Decimal::ZERO
    };

    let additive = tier.adjusted_price + addons + delivery_fee + installation_fee + pickup_surcharge;

    let urgency_applied = is_urgent(inputs.window.start, now, policy.urgency_window_hours);
    let multiplied = if urgency_applied {
        additive * policy.urgency_multiplier
    } else {
        additive
    };

    let grand_total = round_money(multiplied, 0);
    let deposit = round_money(grand_total * policy.deposit_rate, 0);

    PriceOutcome::Priced(PriceBreakdown {
        pack_key: inputs.pack_key.to_string(),
        tier_label: tier.label,
        tier_capacity_note: tier.capacity_note,
        items: tier.items,
        currency: inputs.currency.to_string(),
        base_price: tier.adjusted_price,
        addon_total: addons,
        delivery_fee,
        installation_fee,
        pickup_surcharge,
        urgency_applied,
        grand_total,
        deposit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn tiers() -> Vec<TierSpec> {
        vec![
            TierSpec {
                label: "S".to_string(),
                capacity: 50,
                price_delta: dec!(0),
                items: vec!["2x speaker".to_string(), "1x mixer".to_string()],
            },
            TierSpec {
                label: "M".to_string(),
                capacity: 120,
                price_delta: dec!(200),
                items: vec!["4x speaker".to_string(), "1x mixer".to_string(), "1x sub".to_string()],
            },
            TierSpec {
                label: "L".to_string(),
                capacity: 300,
                price_delta: dec!(550),
                items: vec!["8x speaker".to_string(), "2x mixer".to_string(), "2x sub".to_string()],
            },
        ]
    }

    fn daytime_window() -> BookingWindow {
        BookingWindow {
            start: "2026-06-20T10:00:00Z".parse().unwrap(),
            end: "2026-06-20T18:00:00Z".parse().unwrap(),
        }
    }

    fn far_now() -> DateTime<Utc> {
        // Well outside the 48h urgency window of the test bookings
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn inputs<'a>(
        tiers: &'a [TierSpec],
        party_size: Option<i32>,
        zone: Zone,
        window: &'a BookingWindow,
        addons: &'a [AddonSelection],
    ) -> QuoteInputs<'a> {
        QuoteInputs {
            pack_key: "sound-pack",
            base_price: dec!(300),
            currency: "EUR",
            tiers,
            party_size,
            zone,
            window,
            addons,
        }
    }

    fn priced(outcome: PriceOutcome) -> PriceBreakdown {
        match outcome {
            PriceOutcome::Priced(b) => b,
            PriceOutcome::QuoteRequired { reason } => {
                panic!("expected priced outcome, got quote required: {:?}", reason)
            }
        }
    }

    // ==================== select_tier tests ====================

    #[test]
    fn test_select_tier_smallest_covering() {
        let t = select_tier(dec!(300), &tiers(), Some(50));
        assert_eq!(t.label, "S");
        assert_eq!(t.adjusted_price, dec!(300));
        assert!(!t.above_smallest);
        assert!(!t.needs_manual_quote);

        let t = select_tier(dec!(300), &tiers(), Some(51));
        assert_eq!(t.label, "M");
        assert_eq!(t.adjusted_price, dec!(500));
        assert!(t.above_smallest);
    }

    #[test]
    fn test_select_tier_defaults_to_smallest() {
        let t = select_tier(dec!(300), &tiers(), None);
        assert_eq!(t.label, "S");
        assert!(!t.needs_manual_quote);
    }

    #[test]
    fn test_select_tier_fallback_flags_manual_quote() {
        let t = select_tier(dec!(300), &tiers(), Some(301));
        assert_eq!(t.label, "L");
        assert!(t.needs_manual_quote);
    }

    #[test]
    fn test_select_tier_carries_item_list() {
        let t = select_tier(dec!(300), &tiers(), Some(100));
        assert_eq!(t.items.len(), 3);
        assert_eq!(t.capacity_note, "up to 120 people");
    }

    // ==================== addon_total tests ====================

    #[test]
    fn test_addon_total_flat_per_unit() {
        let addons = vec![
            AddonSelection {
                key: "mic".to_string(),
                name: "Wireless microphone".to_string(),
                unit_price: dec!(25),
                quantity: 2,
            },
            AddonSelection {
                key: "fog".to_string(),
                name: "Fog machine".to_string(),
                unit_price: dec!(40),
                quantity: 1,
            },
        ];
        assert_eq!(addon_total(&addons), dec!(90));
    }

    #[test]
    fn test_addon_total_ignores_non_positive_quantities() {
        let addons = vec![AddonSelection {
            key: "mic".to_string(),
            name: "Wireless microphone".to_string(),
            unit_price: dec!(25),
            quantity: 0,
        }];
        assert_eq!(addon_total(&addons), dec!(0));
        assert_eq!(addon_total(&[]), dec!(0));
    }

    // ==================== pickup surcharge tests ====================

    fn surcharge_policy() -> PickupSurchargePolicy {
        PickupSurchargePolicy {
            late_cutoff: chrono::NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            fee: dec!(40),
        }
    }

    #[test]
    fn test_surcharge_applies_late_same_day() {
        let w = BookingWindow {
            start: "2026-06-20T14:00:00Z".parse().unwrap(),
            end: "2026-06-20T23:00:00Z".parse().unwrap(),
        };
        assert!(pickup_surcharge_applies(&w, Zone::SameCity, &surcharge_policy()));
    }

    #[test]
    fn test_surcharge_skips_daytime_end() {
        assert!(!pickup_surcharge_applies(
            &daytime_window(),
            Zone::SameCity,
            &surcharge_policy()
        ));
    }

    #[test]
    fn test_surcharge_skips_pickup_only() {
        let w = BookingWindow {
            start: "2026-06-20T14:00:00Z".parse().unwrap(),
            end: "2026-06-20T23:00:00Z".parse().unwrap(),
        };
        assert!(!pickup_surcharge_applies(&w, Zone::PickupOnly, &surcharge_policy()));
    }

    #[test]
    fn test_surcharge_absorbed_by_extra_day() {
        // Runs into the next day: next-day pickup already included
        let w = BookingWindow {
            start: "2026-06-20T18:00:00Z".parse().unwrap(),
            end: "2026-06-21T02:00:00Z".parse().unwrap(),
        };
        assert!(!pickup_surcharge_applies(&w, Zone::SameCity, &surcharge_policy()));
    }

    #[test]
    fn test_surcharge_boundary_at_cutoff() {
        let w = BookingWindow {
            start: "2026-06-20T14:00:00Z".parse().unwrap(),
            end: "2026-06-20T22:00:00Z".parse().unwrap(),
        };
        assert!(pickup_surcharge_applies(&w, Zone::InnerRing, &surcharge_policy()));
    }

    // ==================== urgency tests ====================

    #[test]
    fn test_is_urgent_within_window() {
        let now = far_now();
        assert!(is_urgent(now + chrono::Duration::hours(10), now, 48));
        assert!(is_urgent(now + chrono::Duration::hours(47), now, 48));
        assert!(!is_urgent(now + chrono::Duration::hours(48), now, 48));
        assert!(!is_urgent(now + chrono::Duration::hours(200), now, 48));
    }

    // ==================== price_quote scenarios ====================

    #[test]
    fn test_quote_same_city_smallest_tier_is_base_only() {
        // Smallest tier covers the party, same-city delivery included,
        // daytime end, booked far in advance: total is the base price.
        let t = tiers();
        let w = daytime_window();
        let b = priced(price_quote(
            &inputs(&t, Some(50), Zone::SameCity, &w, &[]),
            &PricingPolicy::default(),
            far_now(),
        ));

        assert_eq!(b.tier_label, "S");
        assert_eq!(b.base_price, dec!(300));
        assert_eq!(b.addon_total, dec!(0));
        assert_eq!(b.delivery_fee, dec!(0));
        assert_eq!(b.installation_fee, dec!(0));
        assert_eq!(b.pickup_surcharge, dec!(0));
        assert!(!b.urgency_applied);
        assert_eq!(b.grand_total, dec!(300));
        assert_eq!(b.deposit, dec!(90)); // round(300 * 0.30)
    }

    #[test]
    fn test_quote_urgent_inner_ring_applies_multiplier_last() {
        // M tier, inner ring fee 60, start 10 hours from now.
        // Policy has no installation fees here so the expectation is
        // exactly round((base_M + 60) * 1.20).
        let mut policy = PricingPolicy::default();
        policy.installation_fees.clear();

        let now = far_now();
        let w = BookingWindow {
            start: now + chrono::Duration::hours(10),
            end: now + chrono::Duration::hours(16),
        };

        let t = tiers();
        let b = priced(price_quote(
            &inputs(&t, Some(100), Zone::InnerRing, &w, &[]),
            &policy,
            now,
        ));

        assert_eq!(b.base_price, dec!(500));
        assert_eq!(b.delivery_fee, dec!(60));
        assert!(b.urgency_applied);
        assert_eq!(b.grand_total, dec!(672)); // (500 + 60) * 1.20
        assert_eq!(b.deposit, dec!(202)); // round(672 * 0.30) = 201.6
    }

    #[test]
    fn test_quote_installation_fee_above_smallest_tier() {
        let t = tiers();
        let w = daytime_window();
        let b = priced(price_quote(
            &inputs(&t, Some(100), Zone::SameCity, &w, &[]),
            &PricingPolicy::default(),
            far_now(),
        ));

        assert_eq!(b.tier_label, "M");
        assert_eq!(b.installation_fee, dec!(80));
        assert_eq!(b.grand_total, dec!(580)); // 500 + 80
    }

    #[test]
    fn test_quote_out_of_range_requires_manual_quote() {
        let t = tiers();
        let w = daytime_window();
        match price_quote(
            &inputs(&t, Some(50), Zone::OutOfRange, &w, &[]),
            &PricingPolicy::default(),
            far_now(),
        ) {
            PriceOutcome::QuoteRequired { reason } => {
                assert_eq!(reason, QuoteReason::OutOfRangeZone)
            }
            PriceOutcome::Priced(_) => panic!("out-of-range zone must not auto-price"),
        }
    }

    #[test]
    fn test_quote_oversized_party_requires_manual_quote() {
        let t = tiers();
        let w = daytime_window();
        match price_quote(
            &inputs(&t, Some(500), Zone::SameCity, &w, &[]),
            &PricingPolicy::default(),
            far_now(),
        ) {
            PriceOutcome::QuoteRequired { reason } => {
                assert_eq!(reason, QuoteReason::PartySizeExceedsTiers)
            }
            PriceOutcome::Priced(_) => panic!("oversized party must not auto-price"),
        }
    }

    #[test]
    fn test_quote_full_stack_of_fees() {
        // L tier + add-ons + outer ring + installation + late pickup
        let t = tiers();
        let w = BookingWindow {
            start: "2026-06-20T14:00:00Z".parse().unwrap(),
            end: "2026-06-20T23:00:00Z".parse().unwrap(),
        };
        let addons = vec![AddonSelection {
            key: "mic".to_string(),
            name: "Wireless microphone".to_string(),
            unit_price: dec!(25),
            quantity: 2,
        }];

        let b = priced(price_quote(
            &inputs(&t, Some(200), Zone::OuterRing, &w, &addons),
            &PricingPolicy::default(),
            far_now(),
        ));

        assert_eq!(b.base_price, dec!(850)); // 300 + 550
        assert_eq!(b.addon_total, dec!(50));
        assert_eq!(b.delivery_fee, dec!(120));
        assert_eq!(b.installation_fee, dec!(150));
        assert_eq!(b.pickup_surcharge, dec!(40));
        assert_eq!(b.grand_total, dec!(1210));
        assert_eq!(b.deposit, dec!(363));
    }

    #[test]
    fn test_quote_is_deterministic_for_fixed_now() {
        let t = tiers();
        let w = daytime_window();
        let now = far_now();
        let q = inputs(&t, Some(100), Zone::InnerRing, &w, &[]);

        let a = priced(price_quote(&q, &PricingPolicy::default(), now));
        let b = priced(price_quote(&q, &PricingPolicy::default(), now));
        assert_eq!(a, b);
    }

    #[test]
    fn test_breakdown_serializes_decimals_as_strings() {
        let t = tiers();
        let w = daytime_window();
        let b = priced(price_quote(
            &inputs(&t, Some(50), Zone::SameCity, &w, &[]),
            &PricingPolicy::default(),
            far_now(),
        ));

        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["grand_total"], serde_json::json!("300"));
        assert_eq!(json["deposit"], serde_json::json!("90"));

        let back: PriceBreakdown = serde_json::from_value(json).unwrap();
        assert_eq!(back, b);
    }

    // ==================== round_money tests ====================

    #[test]
    fn test_round_money_bankers_rounding_to_even() {
        assert_eq!(round_money(dec!(2.5), 0), dec!(2));
        assert_eq!(round_money(dec!(3.5), 0), dec!(4));
        assert_eq!(round_money(dec!(4.5), 0), dec!(4));
    }

    #[test]
    fn test_round_money_normal_rounding() {
        assert_eq!(round_money(dec!(201.6), 0), dec!(202));
        assert_eq!(round_money(dec!(201.4), 0), dec!(201));
        assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
    }
}
