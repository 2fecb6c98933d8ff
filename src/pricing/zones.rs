//! Logistics zone resolution.
//!
//! Classifies a postal code into a delivery zone by prefix match against
//! the configured zone table. Total over all string inputs: anything that
//! does not match a known prefix is `OutOfRange`, never an error.

use serde::{Deserialize, Serialize};

/// Logistics zone derived from a postal code.
///
/// `OutOfRange` never resolves to an automatic delivery price; quotes for
/// it are handled manually by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    SameCity,
    InnerRing,
    OuterRing,
    PickupOnly,
    OutOfRange,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::SameCity => "same_city",
            Zone::InnerRing => "inner_ring",
            Zone::OuterRing => "outer_ring",
            Zone::PickupOnly => "pickup_only",
            Zone::OutOfRange => "out_of_range",
        }
    }
}

/// A single prefix rule in the zone table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonePrefixRule {
    pub prefix: String,
    pub zone: Zone,
}

/// Resolve a postal code to a zone.
///
/// An explicit caller-supplied zone always wins over the computed one
/// (staff can override misclassified edge addresses). Matching is
/// longest-prefix-first so a specific rule like "1050" beats "10".
pub fn resolve_zone(rules: &[ZonePrefixRule], postal_code: &str, override_zone: Option<Zone>) -> Zone {
    if let Some(zone) = override_zone {
        return zone;
    }

    let code = postal_code.trim();

    rules
        .iter()
        .filter(|r| code.starts_with(r.prefix.as_str()))
        .max_by_key(|r| r.prefix.len())
        .map(|r| r.zone)
        .unwrap_or(Zone::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<ZonePrefixRule> {
        vec![
            ZonePrefixRule { prefix: "10".to_string(), zone: Zone::SameCity },
            ZonePrefixRule { prefix: "1050".to_string(), zone: Zone::PickupOnly },
            ZonePrefixRule { prefix: "11".to_string(), zone: Zone::InnerRing },
            ZonePrefixRule { prefix: "12".to_string(), zone: Zone::OuterRing },
        ]
    }

    #[test]
    fn test_resolve_zone_prefix_match() {
        assert_eq!(resolve_zone(&rules(), "10234", None), Zone::SameCity);
        assert_eq!(resolve_zone(&rules(), "11902", None), Zone::InnerRing);
        assert_eq!(resolve_zone(&rules(), "12001", None), Zone::OuterRing);
    }

    #[test]
    fn test_resolve_zone_longest_prefix_wins() {
        // "1050x" matches both "10" and "1050"; the longer rule wins
        assert_eq!(resolve_zone(&rules(), "10501", None), Zone::PickupOnly);
    }

    #[test]
    fn test_resolve_zone_unknown_is_out_of_range() {
        assert_eq!(resolve_zone(&rules(), "99999", None), Zone::OutOfRange);
        assert_eq!(resolve_zone(&rules(), "", None), Zone::OutOfRange);
        assert_eq!(resolve_zone(&rules(), "not-a-code", None), Zone::OutOfRange);
    }

    #[test]
    fn test_resolve_zone_override_wins() {
        assert_eq!(
            resolve_zone(&rules(), "99999", Some(Zone::SameCity)),
            Zone::SameCity
        );
        // Override beats the computed zone too
        assert_eq!(
            resolve_zone(&rules(), "10234", Some(Zone::PickupOnly)),
            Zone::PickupOnly
        );
    }

    #[test]
    fn test_resolve_zone_is_deterministic() {
        for _ in 0..3 {
            assert_eq!(resolve_zone(&rules(), "11902", None), Zone::InnerRing);
        }
    }

    #[test]
    fn test_resolve_zone_trims_whitespace() {
        assert_eq!(resolve_zone(&rules(), " 10234 ", None), Zone::SameCity);
    }
}
