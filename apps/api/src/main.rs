mod cache;
mod config;
mod errors;
mod maps;
mod matching;
mod planner;
mod poi;
mod routes;
mod searcher;
mod solution;
mod state;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::{PlaceCache, RedisCache};
use crate::config::Config;
use crate::maps::{DetailField, MapsClient};
use crate::planner::events::{spawn_event_writer, EventSink};
use crate::routes::build_router;
use crate::searcher::PoiSearcher;
use crate::solution::Solver;
use crate::state::AppState;

/// Server-level I/O timeout, applied to every request.
const SERVER_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    let default_filter = format!(
        "{}={}",
        env!("CARGO_PKG_NAME").replace('-', "_"),
        &config.rust_log
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Daytrip API v{}", env!("CARGO_PKG_VERSION"));

    // Upstream places client
    let mut maps = MapsClient::new(config.google_maps_api_key.clone());
    if let Some(raw) = &config.maps_detail_fields {
        let fields: Vec<DetailField> = raw
            .split(',')
            .filter_map(|field| DetailField::parse(field.trim()))
            .collect();
        if !fields.is_empty() {
            maps = maps.with_detail_fields(fields);
        }
    }
    info!("maps client initialized");

    // Redis cache; unreachable cache is fatal at startup
    let redis = RedisCache::connect(&config.redis_url).await?;

    // Planning event log, best-effort analytics off the critical path
    let (events, event_rx) = EventSink::channel();
    let _event_writer = spawn_event_writer(
        redis.connection(),
        config.redis_stream_name.clone(),
        event_rx,
    );

    let cache: Arc<dyn PlaceCache> = Arc::new(redis);
    let searcher = Arc::new(PoiSearcher::new(Arc::new(maps), cache.clone()));
    let solver = Arc::new(Solver::new(searcher));

    let state = AppState {
        cache,
        solver,
        events,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(SERVER_TIMEOUT));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
