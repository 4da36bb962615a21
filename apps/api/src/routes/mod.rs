pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::planner;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/plans", get(planner::get_plans_handler).post(planner::post_plans_handler))
        .route("/signup", post(planner::user_component_handler))
        .route("/login", post(planner::user_component_handler))
        .route(
            "/migrate/user-ratings-total",
            get(planner::user_ratings_total_migration_handler),
        )
        .route("/migrate/url", get(planner::url_migration_handler));

    let stats = Router::new()
        .route("/places", get(planner::place_stats_handler))
        .route("/cities", get(planner::city_stats_handler));

    Router::new()
        .route("/", get(planner::index_handler))
        .route("/health", get(health::health_handler))
        .nest("/v1", v1)
        .nest("/stats", stats)
        .with_state(state)
}
