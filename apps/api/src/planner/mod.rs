//! Planning HTTP surface: plan endpoints, stats, admin backfills.
//!
//! Full HTML templating and the user signup/login component are external
//! collaborators; plans render through a small inline page builder and the
//! auth routes answer for the delegated component.

pub mod events;

use axum::extract::{Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::Json;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::cache::PlaceCache;
use crate::config::Environment;
use crate::errors::AppError;
use crate::matching::place::stay_duration_hours;
use crate::poi::{PlaceCategory, Weekday};
use crate::searcher::migrations::MigrationSummary;
use crate::solution::{
    standard_request, PlanningRequest, PlanningSolution, SlotRequest, TimeInterval,
};
use crate::state::AppState;

use events::PlanningEvent;

/// Most slots a POST request may ask for per category; bounds the
/// enumeration the solver walks.
pub const MAX_SLOTS_PER_CATEGORY: usize = 4;

static SEARCH_RADIUS: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[1-9][0-9]{2,5}$").expect("radius regex"));

/// Validates the `radius` query parameter (meters, lower bound 100).
fn validate_search_radius(radius: &str) -> bool {
    SEARCH_RADIUS.is_match(radius)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Planning endpoints are open outside production.
fn require_user(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if state.config.environment != Environment::Production {
        return Ok(());
    }
    check_token(state, headers)
}

/// Admin endpoints always check the token when one is configured.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    if state.config.admin_token.is_none() && state.config.environment != Environment::Production {
        return Ok(());
    }
    check_token(state, headers)
}

fn check_token(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let expected = state
        .config
        .admin_token
        .as_deref()
        .ok_or(AppError::Unauthorized)?;
    match bearer_token(headers) {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

// ── Views ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TimeSectionPlace {
    pub place_name: String,
    pub start_time: u8,
    pub end_time: u8,
    pub address: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct PlanView {
    pub score: f64,
    pub places: Vec<TimeSectionPlace>,
}

#[derive(Debug, Serialize)]
pub struct PlanningView {
    pub travel_destination: String,
    pub plans: Vec<PlanView>,
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_view(request: &PlanningRequest, solutions: Vec<PlanningSolution>) -> PlanningView {
    let travel_destination = request
        .location
        .split_once(',')
        .map(|(city, _)| title_case(city))
        .unwrap_or_else(|| "Dream Vacation Destination".to_string());

    let plans = solutions
        .into_iter()
        .map(|solution| {
            let places = request
                .slots
                .iter()
                .zip(0..solution.place_ids.len())
                .map(|(slot, idx)| TimeSectionPlace {
                    place_name: solution.place_names[idx].clone(),
                    start_time: slot.window.start,
                    end_time: slot.window.end,
                    address: solution.place_addresses[idx].clone(),
                    url: solution.place_urls[idx].clone(),
                })
                .collect();
            PlanView {
                score: solution.score,
                places,
            }
        })
        .collect();

    PlanningView {
        travel_destination,
        plans,
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

fn render_index_page() -> String {
    "<!DOCTYPE html>\n<html>\n<head><title>Daytrip</title></head>\n<body>\n\
     <h1>Daytrip</h1>\n\
     <p>Plan a day of visits and eateries: <code>GET /v1/plans?country=USA&amp;city=San+Diego</code></p>\n\
     </body>\n</html>\n"
        .to_string()
}

fn render_plans_page(view: &PlanningView) -> String {
    let mut body = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Plans for {dest}</title></head>\n<body>\n<h1>{dest}</h1>\n",
        dest = view.travel_destination
    );
    for (idx, plan) in view.plans.iter().enumerate() {
        body.push_str(&format!(
            "<h2>Plan {} (score {:.2})</h2>\n<ul>\n",
            idx + 1,
            plan.score
        ));
        for place in &plan.places {
            body.push_str(&format!(
                "<li>{:02}:00&ndash;{:02}:00 <a href=\"{}\">{}</a> &mdash; {}</li>\n",
                place.start_time, place.end_time, place.url, place.place_name, place.address
            ));
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</body>\n</html>\n");
    body
}

// ── Planning orchestration ──────────────────────────────────────────────────

/// Runs the solver and emits a usage event for every valid request,
/// including those that end with no valid solution.
async fn planning(
    state: &AppState,
    request: &PlanningRequest,
    user: &str,
) -> Result<PlanningView, AppError> {
    let request_id = Uuid::new_v4();
    let outcome = state.solver.solve(request).await;

    if let Some((city, country)) = request.location.split_once(',') {
        let event = PlanningEvent {
            user: user.to_string(),
            city: city.to_string(),
            country: country.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        info!(%request_id, user, city, country, "planning request served");
        state.events.record(event);
    }

    let solutions = outcome?;
    Ok(build_view(request, solutions))
}

// ── Handlers ────────────────────────────────────────────────────────────────

/// GET /
pub async fn index_handler() -> Html<String> {
    Html(render_index_page())
}

#[derive(Debug, Deserialize)]
pub struct GetPlansParams {
    pub country: Option<String>,
    pub city: Option<String>,
    pub radius: Option<String>,
    pub weekday: Option<String>,
    #[serde(rename = "numberResults")]
    pub number_results: Option<String>,
}

/// GET /v1/plans
pub async fn get_plans_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<GetPlansParams>,
) -> Result<Html<String>, AppError> {
    require_user(&state, &headers)?;

    let country = params.country.unwrap_or_else(|| "USA".to_string());
    let city = params.city.unwrap_or_else(|| "San Diego".to_string());
    let radius = params.radius.unwrap_or_else(|| "10000".to_string());
    let weekday = params.weekday.unwrap_or_else(|| "5".to_string());
    let number_results = params.number_results.unwrap_or_else(|| "5".to_string());

    let num_results: usize = number_results
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid number of results {number_results}")))?;
    let weekday = weekday
        .parse::<u8>()
        .ok()
        .and_then(Weekday::from_index)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid weekday of {weekday}")))?;
    if !validate_search_radius(&radius) {
        return Err(AppError::InvalidInput(format!(
            "invalid search radius of {radius}"
        )));
    }
    let search_radius: u32 = radius
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("invalid search radius of {radius}")))?;

    let mut request = standard_request(weekday, num_results);
    request.location = format!("{city},{country}");
    request.search_radius = search_radius;

    let view = planning(&state, &request, "guest").await?;
    Ok(Html(render_plans_page(&view)))
}

#[derive(Debug, Deserialize)]
pub struct PlanningPostRequest {
    pub country: String,
    pub city: String,
    pub weekday: u8,
    pub start_time: u8,
    pub end_time: u8,
    pub num_visit: usize,
    pub num_eatery: usize,
}

/// Expands a POST body into slot requests: categories alternate
/// eatery-first, each slot sized to its category's stay duration, packed
/// from `start_time`.
fn process_post_request(request: &PlanningPostRequest) -> Result<PlanningRequest, AppError> {
    let weekday = Weekday::from_index(request.weekday)
        .ok_or_else(|| AppError::InvalidInput(format!("invalid weekday of {}", request.weekday)))?;
    if request.end_time > 24 || request.start_time >= request.end_time {
        return Err(AppError::InvalidInput(format!(
            "invalid time window {}..{}",
            request.start_time, request.end_time
        )));
    }
    if request.num_visit == 0 && request.num_eatery == 0 {
        return Err(AppError::InvalidInput(
            "request at least one visit or eatery slot".to_string(),
        ));
    }
    if request.num_visit > MAX_SLOTS_PER_CATEGORY || request.num_eatery > MAX_SLOTS_PER_CATEGORY {
        return Err(AppError::InvalidInput(format!(
            "at most {MAX_SLOTS_PER_CATEGORY} slots per category"
        )));
    }

    let mut slots = Vec::new();
    let mut remaining_eatery = request.num_eatery;
    let mut remaining_visit = request.num_visit;
    let mut cursor = request.start_time;
    let mut eatery_turn = true;
    while remaining_eatery + remaining_visit > 0 {
        let category = if (eatery_turn && remaining_eatery > 0) || remaining_visit == 0 {
            remaining_eatery -= 1;
            PlaceCategory::Eatery
        } else {
            remaining_visit -= 1;
            PlaceCategory::Visit
        };
        eatery_turn = !eatery_turn;

        let stay = stay_duration_hours(category).ceil() as u8;
        let end = cursor + stay;
        if end > request.end_time {
            return Err(AppError::InvalidInput(format!(
                "time window {}..{} is too small for the requested slots",
                request.start_time, request.end_time
            )));
        }
        slots.push(SlotRequest {
            category,
            window: TimeInterval { start: cursor, end },
        });
        cursor = end;
    }

    let mut planning_request = standard_request(weekday, 0);
    planning_request.location = format!("{},{}", request.city, request.country);
    planning_request.slots = slots;
    Ok(planning_request)
}

/// POST /v1/plans
pub async fn post_plans_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PlanningPostRequest>,
) -> Result<Html<String>, AppError> {
    require_user(&state, &headers)?;
    let request = process_post_request(&body)?;
    let view = planning(&state, &request, "guest").await?;
    Ok(Html(render_plans_page(&view)))
}

/// POST /v1/signup and /v1/login, owned by the external user component.
pub async fn user_component_handler() -> Result<(), AppError> {
    Err(AppError::NotImplemented)
}

/// GET /v1/migrate/user-ratings-total
pub async fn user_ratings_total_migration_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MigrationSummary>, AppError> {
    require_admin(&state, &headers)?;
    let summary = state.solver.searcher().add_user_ratings_total().await?;
    Ok(Json(summary))
}

/// GET /v1/migrate/url
pub async fn url_migration_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MigrationSummary>, AppError> {
    require_admin(&state, &headers)?;
    let summary = state.solver.searcher().add_url().await?;
    Ok(Json(summary))
}

/// GET /stats/places
pub async fn place_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let place_count = state.cache.place_detail_keys().await?.len();
    let eatery_count = state
        .cache
        .place_count_by_category(PlaceCategory::Eatery)
        .await?;
    let visit_count = state
        .cache
        .place_count_by_category(PlaceCategory::Visit)
        .await?;
    Ok(Json(json!({
        "place count": place_count,
        "eatery count": eatery_count,
        "visit count": visit_count,
    })))
}

#[derive(Debug, Serialize)]
pub struct GeocodeCityView {
    pub count: usize,
    pub cities: std::collections::HashMap<String, String>,
}

/// GET /stats/cities
pub async fn city_stats_handler(
    State(state): State<AppState>,
) -> Result<Json<GeocodeCityView>, AppError> {
    let cities = state.cache.geocoded_cities().await?;
    Ok(Json(GeocodeCityView {
        count: cities.len(),
        cities,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_search_radius() {
        assert!(validate_search_radius("100"));
        assert!(validate_search_radius("10000"));
        assert!(validate_search_radius("99999"));
        assert!(!validate_search_radius("99"));
        assert!(!validate_search_radius("0100"));
        assert!(!validate_search_radius("abc"));
        assert!(!validate_search_radius(""));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("san diego"), "San Diego");
        assert_eq!(title_case("paris"), "Paris");
    }

    fn post_request(num_visit: usize, num_eatery: usize, start: u8, end: u8) -> PlanningPostRequest {
        PlanningPostRequest {
            country: "USA".to_string(),
            city: "San Diego".to_string(),
            weekday: 0,
            start_time: start,
            end_time: end,
            num_visit,
            num_eatery,
        }
    }

    #[test]
    fn test_post_request_alternates_eatery_first() {
        let request = process_post_request(&post_request(2, 2, 8, 18)).unwrap();
        let categories: Vec<PlaceCategory> =
            request.slots.iter().map(|slot| slot.category).collect();
        assert_eq!(
            categories,
            vec![
                PlaceCategory::Eatery,
                PlaceCategory::Visit,
                PlaceCategory::Eatery,
                PlaceCategory::Visit,
            ]
        );
        // slots pack contiguously from the start hour
        assert_eq!(request.slots[0].window, TimeInterval { start: 8, end: 9 });
        assert_eq!(request.slots[1].window, TimeInterval { start: 9, end: 12 });
        assert_eq!(request.slots[2].window, TimeInterval { start: 12, end: 13 });
        assert_eq!(request.slots[3].window, TimeInterval { start: 13, end: 16 });
    }

    #[test]
    fn test_post_request_rejects_small_window() {
        let result = process_post_request(&post_request(2, 2, 8, 10));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_post_request_rejects_bad_weekday() {
        let mut request = post_request(1, 1, 8, 18);
        request.weekday = 7;
        assert!(matches!(
            process_post_request(&request),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_post_request_rejects_empty_slots() {
        assert!(matches!(
            process_post_request(&post_request(0, 0, 8, 18)),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_render_plans_page_lists_places() {
        let view = PlanningView {
            travel_destination: "San Diego".to_string(),
            plans: vec![PlanView {
                score: 3.25,
                places: vec![TimeSectionPlace {
                    place_name: "Museum of Us".to_string(),
                    start_time: 9,
                    end_time: 12,
                    address: "1350 El Prado".to_string(),
                    url: "https://maps.google.com/?cid=1".to_string(),
                }],
            }],
        };
        let html = render_plans_page(&view);
        assert!(html.contains("San Diego"));
        assert!(html.contains("Museum of Us"));
        assert!(html.contains("09:00"));
        assert!(html.contains("https://maps.google.com/?cid=1"));
    }
}
