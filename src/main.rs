//! movie-store - Movie Storefront with Hexagonal Architecture
//!
//! This is the composition root that wires together all the components.

use movie_store::adapters::inbound::{ApiServer, ApiState};
use movie_store::adapters::outbound::{
    build_http_client, build_provider_chain, DashMapCartStore, SqliteStore,
};
use movie_store::application::{CatalogService, GeocodingResolver, OrderService, PetitionService};
use movie_store::config::load_config;
use movie_store::domain::ports::GeoResolver;
use movie_store::domain::value_objects::GeocodeMode;
use movie_store::infrastructure::{
    shutdown_signal, CircuitBreaker, CircuitBreakerConfig, EnrichmentWorker, RateLimitConfig,
    RateLimiter, ShutdownController,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;

const ENRICHMENT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!(
        "starting movie-store listen={} db={} geocode_mode={}",
        cfg.listen_addr,
        cfg.db_path,
        cfg.geocode_mode
    );

    // ===== COMPOSITION ROOT =====

    // 1. Outbound adapters

    // Persistence (SQLite)
    let store = Arc::new(SqliteStore::open(&cfg.db_path)?);
    let seeded = store.seed_movies().await?;
    if seeded > 0 {
        tracing::info!("seeded {} movies", seeded);
    }

    // Session carts (DashMap)
    let carts = Arc::new(DashMapCartStore::new());
    carts.start_gc(
        Duration::from_secs(cfg.cart_ttl_secs),
        Duration::from_secs(cfg.cart_gc_interval_secs),
    );

    // Geocoding providers sharing one client, one throttle and one breaker
    let client = build_http_client(&cfg.user_agent, cfg.geocode_timeout())?;
    let nominatim_limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        min_interval: cfg.nominatim_delay(),
    }));
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
    let providers = build_provider_chain(&client, &cfg.provider_chain(), nominatim_limiter);

    let resolver = GeocodingResolver::new(providers, breaker.clone());
    let provider_names = resolver.provider_names();
    tracing::info!("geocoding providers: {:?}", provider_names);
    let resolver: Arc<dyn GeoResolver> = Arc::new(resolver);

    // 2. Application services
    let mut orders = OrderService::new(
        store.clone(),
        store.clone(),
        carts.clone(),
        resolver.clone(),
        cfg.default_country.clone(),
    );

    let mut enrichment = None;
    if cfg.geocode_mode == GeocodeMode::Deferred {
        let (worker, queue) = EnrichmentWorker::new(store.clone(), resolver.clone());
        enrichment = Some(worker.spawn());
        orders = orders.with_enrichment(queue);
        orders.requeue_pending().await?;
    }

    let state = ApiState {
        catalog: Arc::new(CatalogService::new(store.clone(), carts)),
        orders: Arc::new(orders),
        petitions: Arc::new(PetitionService::new(store.clone())),
        users: store,
        breaker,
        providers: provider_names,
    };

    // 3. Inbound adapter
    let shutdown = ShutdownController::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let server = ApiServer::new(cfg.listen_addr, state);
    server.run(shutdown).await?;

    // the server dropped the last queue handle, so the worker drains and exits
    if let Some(worker) = enrichment {
        match tokio::time::timeout(ENRICHMENT_DRAIN_TIMEOUT, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("enrichment worker failed: {}", e),
            Err(_) => tracing::warn!("enrichment still running at exit, pending orders are requeued on next start"),
        }
    }

    Ok(())
}
