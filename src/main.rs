use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rentkit_web::booking::{self, TracingNotifier};
use rentkit_web::cache::{self, AppCache};
use rentkit_web::pricing::PricingPolicy;
use rentkit_web::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentkit_web=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!()
        .run(&db)
        .await
        .context("failed to run migrations")?;

    let cache = AppCache::new();
    let policy = Arc::new(PricingPolicy::from_env());

    let state = AppState {
        db: db.clone(),
        cache: cache.clone(),
        policy,
        notifier: Arc::new(TracingNotifier),
    };

    // Background tasks: catalog warm-up and stale-hold sweep
    tokio::spawn(cache::start_cache_warmer(cache, db.clone()));
    tokio::spawn(booking::start_hold_sweeper(db));

    let router = app(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Booking engine listening on {}", bind_addr);
    axum::serve(listener, router).await?;

    Ok(())
}
