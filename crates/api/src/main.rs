use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use awardfare_core::cache::{InMemoryCache, ResultCache};
use awardfare_core::engine::AggregationEngine;
use awardfare_core::usage::{UsageGate, UsagePolicy};
use awardfare_db::redis_cache::RedisCache;
use awardfare_db::store::{load_catalog, PgFlightStore, PgSearchHistory, PgUsageStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use awardfare_api::background;
use awardfare_api::config::ServerConfig;
use awardfare_api::router::build_app_router;
use awardfare_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "awardfare_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        redis = config.redis_url.is_some(),
        auth = config.jwt.is_some(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = awardfare_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    awardfare_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    awardfare_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Reference catalog ---
    let catalog = load_catalog(&pool)
        .await
        .expect("Failed to load reference catalog");

    // --- Result cache ---
    let (cache, local_cache) = match &config.redis_url {
        Some(url) => {
            let redis: Arc<dyn ResultCache> = Arc::new(
                RedisCache::connect(url)
                    .await
                    .expect("Failed to connect to Redis"),
            );
            (redis, None)
        }
        None => {
            tracing::info!("REDIS_URL not set, using in-process result cache");
            let local = Arc::new(InMemoryCache::new());
            let shared: Arc<dyn ResultCache> = local.clone();
            (shared, Some(local))
        }
    };

    // --- Engine and usage gate ---
    let flights = Arc::new(PgFlightStore::new(pool.clone()));
    let engine = AggregationEngine::new(
        flights.clone(),
        flights,
        cache,
        Arc::new(catalog),
        config.engine_config(),
    );
    let usage = UsageGate::new(
        Arc::new(PgUsageStore::new(pool.clone())),
        UsagePolicy::default(),
    );

    // --- Housekeeping ---
    let housekeeping_cancel = CancellationToken::new();
    let housekeeping_handle = tokio::spawn(background::housekeeping::run(
        pool.clone(),
        local_cache,
        Duration::from_secs(config.purge_interval_secs),
        housekeeping_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        engine: Arc::new(engine),
        usage: Arc::new(usage),
        history: Arc::new(PgSearchHistory::new(pool)),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    housekeeping_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), housekeeping_handle).await;
    tracing::info!("Housekeeping job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
