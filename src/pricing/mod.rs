//! Pricing engine module.
//!
//! Deterministic price computation for equipment rental packs: tier
//! selection, zone-based delivery fees, installation fees and time-based
//! surcharges. The site frontend calls this over HTTP/JSON.

pub mod calculators;
pub mod models;
pub mod policy;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;
pub mod zones;

// Re-export commonly used items
pub use calculators::{round_money, PriceBreakdown, PriceOutcome, QuoteReason};
pub use policy::PricingPolicy;
pub use routes::router;
pub use services::{compute_price, AddonChoice, QuoteSpec};
pub use zones::{resolve_zone, Zone};
