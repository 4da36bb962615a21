//! The tiered POI lookup: request → cache → upstream places API.
//!
//! Geocodes resolve through the cache first; nearby searches are served from
//! the cache while the city/category index is fresh and large enough,
//! otherwise the upstream is queried with a widened radius and the results
//! are written back.

pub mod migrations;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::cache::{CacheError, PlaceCache};
use crate::maps::{GeocodeQuery, Geocoded, MapsError, PlaceSearchRequest, SearchClient};
use crate::poi::Place;

/// Maximum radius supported by the upstream nearby search (16 km); used when
/// refreshing a stale or insufficient cache entry.
pub const MAX_SEARCH_RADIUS_METERS: u32 = 16_000;

/// Cached city/category indexes older than this require an upstream refresh.
pub const FRESHNESS_WINDOW_DAYS: i64 = 14;

/// Deadline applied to one whole upstream nearby search.
pub const NEARBY_SEARCH_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("could not resolve request location {0:?}")]
    InvalidLocation(String),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("upstream search failed: {0}")]
    Upstream(#[from] MapsError),
}

pub struct PoiSearcher {
    maps: Arc<dyn SearchClient>,
    cache: Arc<dyn PlaceCache>,
}

impl PoiSearcher {
    pub fn new(maps: Arc<dyn SearchClient>, cache: Arc<dyn PlaceCache>) -> Self {
        Self { maps, cache }
    }

    /// Resolves a city/country pair to coordinates, reading through the
    /// cache. On an upstream correction of the city name the query is
    /// re-keyed to the canonical spelling and both keys are persisted.
    pub async fn geocode(&self, query: &mut GeocodeQuery) -> Result<Geocoded, SearchError> {
        if let Some(hit) = self.cache.get_geocode(query).await? {
            query.city = hit.city.clone();
            return Ok(hit);
        }
        let geocoded = self.maps.geocode(query).await?;
        self.cache.set_geocode(query, &geocoded).await?;
        info!(
            city = %query.city,
            country = %query.country,
            lat = geocoded.lat,
            lng = geocoded.lng,
            "geocode resolved"
        );
        query.city = geocoded.city.clone();
        Ok(geocoded)
    }

    /// The tiered nearby search. On return `request.location` holds the
    /// resolved `"lat,lng"` pair. Never returns more than
    /// `request.max_results`; may return fewer than `request.min_results`
    /// (logged).
    pub async fn nearby_search(
        &self,
        request: &mut PlaceSearchRequest,
    ) -> Result<Vec<Place>, SearchError> {
        let Some((city, country)) = request.location.split_once(',') else {
            return Err(SearchError::InvalidLocation(request.location.clone()));
        };
        let mut query = GeocodeQuery::new(city, country);
        let geocoded = match self.geocode(&mut query).await {
            Ok(geocoded) => geocoded,
            Err(err) => {
                warn!(location = %request.location, error = %err, "geocoding failed");
                return Err(SearchError::InvalidLocation(request.location.clone()));
            }
        };
        request.location = format!("{},{}", geocoded.lat, geocoded.lng);

        let cached = self
            .cache
            .get_places(request.category, &query.city, &query.country)
            .await?;
        let last_search = self
            .cache
            .last_search_time(request.category, &query.city, &query.country)
            .await?;
        let now = Utc::now();

        if is_fresh(cached.len(), request.min_results, last_search, now) {
            info!(
                category = %request.category,
                city = %query.city,
                cached = cached.len(),
                "nearby search served from cache"
            );
            return Ok(capped(cached, request.max_results));
        }

        if let Err(err) = self
            .cache
            .set_last_search_time(request.category, &query.city, &query.country, now)
            .await
        {
            warn!(error = %err, "failed to record last search time");
        }

        // Widen the radius for the paid upstream call; the caller's radius
        // is left untouched.
        let mut upstream_request = request.clone();
        upstream_request.radius = MAX_SEARCH_RADIUS_METERS;
        let deadline = Instant::now() + NEARBY_SEARCH_DEADLINE;
        let outcome = self.maps.nearby_search(&upstream_request, deadline).await;

        if !outcome.places.is_empty() {
            self.cache
                .set_places_on_category(
                    request.category,
                    &query.city,
                    &query.country,
                    &outcome.places,
                )
                .await;
        }

        let places = if outcome.places.is_empty() {
            cached
        } else {
            outcome.places
        };

        if let Some(err) = outcome.error {
            if places.is_empty() {
                return Err(SearchError::Upstream(err));
            }
            warn!(error = %err, returned = places.len(), "upstream error; returning partial results");
        }

        if places.len() < request.min_results {
            warn!(
                found = places.len(),
                requested = request.min_results,
                category = %request.category,
                "fewer results than requested"
            );
        }
        if places.is_empty() {
            warn!(
                location = %request.location,
                radius = request.radius,
                category = %request.category,
                "no qualified POI found; location may be invalid"
            );
        }
        Ok(capped(places, request.max_results))
    }

    pub(crate) fn cache(&self) -> &Arc<dyn PlaceCache> {
        &self.cache
    }

    pub(crate) fn maps(&self) -> &Arc<dyn SearchClient> {
        &self.maps
    }
}

/// A cache entry satisfies a request iff it holds at least `min` places and
/// the index was refreshed within the freshness window.
fn is_fresh(
    cached_count: usize,
    min_results: usize,
    last_search: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    cached_count >= min_results
        && last_search
            .is_some_and(|t| now - t <= chrono::Duration::days(FRESHNESS_WINDOW_DAYS))
}

fn capped(mut places: Vec<Place>, max_results: usize) -> Vec<Place> {
    places.truncate(max_results);
    places
}
