//! Database models for the pack catalog.
//!
//! These models use sqlx's FromRow derive for direct database
//! deserialization. Packs are immutable reference data and are cached.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Equipment pack from catalog_packs
#[derive(Debug, Clone, FromRow)]
pub struct Pack {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub base_price: Decimal,
    pub currency: String,
    pub active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Capacity tier from catalog_pack_tiers
///
/// Tiers are ordered by capacity; each carries its own item set and a
/// price delta on top of the pack base price.
#[derive(Debug, Clone, FromRow)]
pub struct PackTier {
    pub id: Uuid,
    pub pack_id: Uuid,
    pub label: String,
    pub capacity: i32,
    pub price_delta: Decimal,
    pub items: serde_json::Value,
}

impl PackTier {
    /// Item names for this tier; malformed catalog JSON yields an empty list
    pub fn item_names(&self) -> Vec<String> {
        self.items
            .as_array()
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Add-on from catalog_pack_addons (flat per-unit price, no quantity discount)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PackAddon {
    pub id: Uuid,
    pub pack_id: Uuid,
    pub key: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

/// A pack with its tiers and add-ons, as cached
#[derive(Debug, Clone)]
pub struct PackDetail {
    pub pack: Pack,
    /// Sorted ascending by capacity
    pub tiers: Vec<PackTier>,
    pub addons: Vec<PackAddon>,
}

impl PackDetail {
    pub fn addon_by_key(&self, key: &str) -> Option<&PackAddon> {
        self.addons.iter().find(|a| a.key == key)
    }
}
