//! Pricing policy tables.
//!
//! Delivery fees, installation fees, the late-pickup surcharge cutoff and
//! the urgency multiplier are business policy, not code. They load from a
//! JSON file at startup (`PRICING_POLICY_PATH`) with compiled-in defaults
//! as fallback, so ops can retune fees without a deploy.

use chrono::NaiveTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

use super::zones::{Zone, ZonePrefixRule};

/// Late-pickup surcharge rule.
///
/// The surcharge applies when the booking ends at or after `late_cutoff`
/// local time, unless the customer picks up themselves or the window
/// already spans into a later day (next-day pickup is then included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupSurchargePolicy {
    pub late_cutoff: NaiveTime,
    pub fee: Decimal,
}

/// All tunable pricing knobs in one place
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Postal prefix -> zone classification table
    pub zone_rules: Vec<ZonePrefixRule>,
    /// Flat delivery fee per zone; zones absent from the table are
    /// treated as fee-included (zero)
    pub delivery_fees: HashMap<Zone, Decimal>,
    /// Flat installation fee per tier label; the smallest tier never
    /// carries one
    pub installation_fees: HashMap<String, Decimal>,
    pub pickup_surcharge: PickupSurchargePolicy,
    /// Bookings starting within this many hours of evaluation time get
    /// the urgency multiplier
    pub urgency_window_hours: i64,
    pub urgency_multiplier: Decimal,
    /// Deposit as a fraction of the grand total
    pub deposit_rate: Decimal,
}

impl PricingPolicy {
    /// Delivery fee for a zone, or `None` when automatic pricing is not
    /// possible and a manual quote is required.
    ///
    /// Same-city delivery is included in the pack price; pickup-only
    /// means no delivery happens at all. Both are a genuine zero, which
    /// callers must distinguish from the `None` of an out-of-range zone.
    pub fn delivery_fee(&self, zone: Zone) -> Option<Decimal> {
        match zone {
            Zone::SameCity | Zone::PickupOnly => Some(Decimal::ZERO),
            Zone::OutOfRange => None,
            Zone::InnerRing | Zone::OuterRing => {
                Some(self.delivery_fees.get(&zone).copied().unwrap_or(Decimal::ZERO))
            }
        }
    }

    /// Installation fee for a tier label (zero when not in the table)
    pub fn installation_fee(&self, tier_label: &str) -> Decimal {
        self.installation_fees
            .get(tier_label)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Load policy from the file named by `PRICING_POLICY_PATH`, falling
    /// back to defaults when unset or unreadable.
    pub fn from_env() -> Self {
        match std::env::var("PRICING_POLICY_PATH") {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str(&raw) {
                    Ok(policy) => {
                        info!("Loaded pricing policy from {}", path);
                        policy
                    }
                    Err(e) => {
                        warn!("Failed to parse pricing policy {}: {}. Using defaults", path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    warn!("Failed to read pricing policy {}: {}. Using defaults", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

impl Default for PricingPolicy {
    fn default() -> Self {
        let mut delivery_fees = HashMap::new();
        delivery_fees.insert(Zone::InnerRing, dec!(60));
        delivery_fees.insert(Zone::OuterRing, dec!(120));

        let mut installation_fees = HashMap::new();
        installation_fees.insert("M".to_string(), dec!(80));
        installation_fees.insert("L".to_string(), dec!(150));

        Self {
            zone_rules: vec![
                ZonePrefixRule { prefix: "10".to_string(), zone: Zone::SameCity },
                ZonePrefixRule { prefix: "11".to_string(), zone: Zone::InnerRing },
                ZonePrefixRule { prefix: "12".to_string(), zone: Zone::InnerRing },
                ZonePrefixRule { prefix: "13".to_string(), zone: Zone::OuterRing },
                ZonePrefixRule { prefix: "14".to_string(), zone: Zone::OuterRing },
            ],
            delivery_fees,
            installation_fees,
            pickup_surcharge: PickupSurchargePolicy {
                late_cutoff: NaiveTime::from_hms_opt(22, 0, 0).expect("valid cutoff"),
                fee: dec!(40),
            },
            urgency_window_hours: 48,
            urgency_multiplier: dec!(1.20),
            deposit_rate: dec!(0.30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_fee_included_zones_are_zero() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.delivery_fee(Zone::SameCity), Some(Decimal::ZERO));
        assert_eq!(policy.delivery_fee(Zone::PickupOnly), Some(Decimal::ZERO));
    }

    #[test]
    fn test_delivery_fee_out_of_range_is_none_not_zero() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.delivery_fee(Zone::OutOfRange), None);
    }

    #[test]
    fn test_delivery_fee_table_zones() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.delivery_fee(Zone::InnerRing), Some(dec!(60)));
        assert_eq!(policy.delivery_fee(Zone::OuterRing), Some(dec!(120)));
    }

    #[test]
    fn test_installation_fee_smallest_tier_absent() {
        let policy = PricingPolicy::default();
        assert_eq!(policy.installation_fee("S"), Decimal::ZERO);
        assert_eq!(policy.installation_fee("M"), dec!(80));
        assert_eq!(policy.installation_fee("L"), dec!(150));
    }

    #[test]
    fn test_policy_round_trips_through_json() {
        let policy = PricingPolicy::default();
        let raw = serde_json::to_string(&policy).unwrap();
        let back: PricingPolicy = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.urgency_window_hours, 48);
        assert_eq!(back.urgency_multiplier, dec!(1.20));
        assert_eq!(back.pickup_surcharge.fee, dec!(40));
    }
}
