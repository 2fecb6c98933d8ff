//! In-memory caching using moka
//!
//! The pack catalog is immutable reference data that changes rarely, so
//! it is cached aggressively. Availability is NEVER cached: hold and
//! booking existence is always read from the store.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::pricing::models::PackDetail;
use crate::pricing::queries;

/// Application cache holding catalog reference data
#[derive(Clone)]
pub struct AppCache {
    /// Packs with tiers and add-ons (pack key -> PackDetail)
    pub packs: Cache<String, Arc<PackDetail>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Pack catalog: 200 entries, 30 min TTL, 10 min idle
            packs: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            packs_size: self.packs.entry_count(),
        }
    }

    /// Invalidate all caches (after catalog edits)
    pub fn invalidate_all(&self) {
        self.packs.invalidate_all();
        info!("All caches invalidated");
    }

    /// Invalidate a specific pack by key
    pub async fn invalidate_pack(&self, key: &str) {
        self.packs.invalidate(key).await;
        info!("Cache invalidated for pack: {}", key);
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub packs_size: u64,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    // Initial warm-up
    warm_cache(&cache, &db).await;

    // Periodic refresh every 10 minutes
    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with the active pack catalog
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    let packs = match queries::get_active_packs(db).await {
        Ok(packs) => packs,
        Err(e) => {
            warn!("Failed to list packs for cache warm-up: {}", e);
            return;
        }
    };

    for pack in packs {
        match queries::get_pack_detail(db, &pack.key).await {
            Ok(Some(detail)) => {
                cache
                    .packs
                    .insert(pack.key.clone(), Arc::new(detail))
                    .await;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to warm cache for pack {}: {}", pack.key, e),
        }
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
