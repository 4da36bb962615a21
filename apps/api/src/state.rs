use std::sync::Arc;

use crate::cache::PlaceCache;
use crate::config::Config;
use crate::planner::events::EventSink;
use crate::solution::Solver;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<dyn PlaceCache>,
    pub solver: Arc<Solver>,
    pub events: EventSink,
    pub config: Config,
}
