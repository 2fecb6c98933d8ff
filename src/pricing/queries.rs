//! Database queries for the pack catalog.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;

use super::models::{Pack, PackAddon, PackDetail, PackTier};

/// Get an active pack by its catalog key
pub async fn get_pack_by_key(pool: &PgPool, key: &str) -> Result<Option<Pack>> {
    let pack = sqlx::query_as::<_, Pack>(
        r#"
        SELECT id, key, name, base_price, currency, active, deleted_at
        FROM catalog_packs
        WHERE key = $1
          AND active = true
          AND deleted_at IS NULL
        "#,
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(pack)
}

/// Get the capacity tiers for a pack, smallest first
pub async fn get_pack_tiers(pool: &PgPool, pack_id: Uuid) -> Result<Vec<PackTier>> {
    let tiers = sqlx::query_as::<_, PackTier>(
        r#"
        SELECT id, pack_id, label, capacity, price_delta, items
        FROM catalog_pack_tiers
        WHERE pack_id = $1
        ORDER BY capacity ASC
        "#,
    )
    .bind(pack_id)
    .fetch_all(pool)
    .await?;

    Ok(tiers)
}

/// Get the add-ons offered with a pack
pub async fn get_pack_addons(pool: &PgPool, pack_id: Uuid) -> Result<Vec<PackAddon>> {
    let addons = sqlx::query_as::<_, PackAddon>(
        r#"
        SELECT id, pack_id, key, name, unit_price
        FROM catalog_pack_addons
        WHERE pack_id = $1
        ORDER BY key ASC
        "#,
    )
    .bind(pack_id)
    .fetch_all(pool)
    .await?;

    Ok(addons)
}

/// Load a pack with its tiers and add-ons in one go
pub async fn get_pack_detail(pool: &PgPool, key: &str) -> Result<Option<PackDetail>> {
    let pack = match get_pack_by_key(pool, key).await? {
        Some(pack) => pack,
        None => return Ok(None),
    };

    let tiers = get_pack_tiers(pool, pack.id).await?;
    let addons = get_pack_addons(pool, pack.id).await?;

    Ok(Some(PackDetail { pack, tiers, addons }))
}

/// Get all active packs (for cache warming)
pub async fn get_active_packs(pool: &PgPool) -> Result<Vec<Pack>> {
    let packs = sqlx::query_as::<_, Pack>(
        r#"
        SELECT id, key, name, base_price, currency, active, deleted_at
        FROM catalog_packs
        WHERE active = true
          AND deleted_at IS NULL
        ORDER BY key ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(packs)
}
