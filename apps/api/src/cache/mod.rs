//! Redis-backed cache store for geocodes, per-city place indexes, per-place
//! detail records and search freshness timestamps.
//!
//! The [`PlaceCache`] trait is the seam between the searcher and the store;
//! tests substitute an in-memory implementation.

pub mod keys;
pub mod redis_store;

pub use redis_store::RedisCache;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::maps::{Geocoded, GeocodeQuery};
use crate::poi::{Place, PlaceCategory};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Keyed persistent store operations exposed to the searcher and the
/// planner's stats/migration endpoints.
#[async_trait]
pub trait PlaceCache: Send + Sync {
    async fn get_geocode(&self, query: &GeocodeQuery) -> Result<Option<Geocoded>, CacheError>;

    /// Persists a geocode under its canonical city key and, when the
    /// canonical name differs from the queried one, under the original
    /// spelling as well.
    async fn set_geocode(
        &self,
        original: &GeocodeQuery,
        geocoded: &Geocoded,
    ) -> Result<(), CacheError>;

    /// Hydrates the place records indexed for a city/category pair.
    async fn get_places(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
    ) -> Result<Vec<Place>, CacheError>;

    /// Write-back of freshly discovered places: detail records plus the city
    /// index, fanned out concurrently. Best-effort; failures are logged and
    /// do not fail the request.
    async fn set_places_on_category(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
        places: &[Place],
    );

    async fn last_search_time(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
    ) -> Result<Option<DateTime<Utc>>, CacheError>;

    async fn set_last_search_time(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
        when: DateTime<Utc>,
    ) -> Result<(), CacheError>;

    /// All `place_details:*` keys currently in the store.
    async fn place_detail_keys(&self) -> Result<Vec<String>, CacheError>;

    async fn place_count_by_category(&self, category: PlaceCategory)
        -> Result<u64, CacheError>;

    /// Geocoded cities as `"city, country" => "lat,lng"`.
    async fn geocoded_cities(&self) -> Result<HashMap<String, String>, CacheError>;

    async fn get_place_by_key(&self, key: &str) -> Result<Option<Place>, CacheError>;

    async fn set_place(&self, category: PlaceCategory, place: &Place) -> Result<(), CacheError>;

    async fn is_place_migrated(&self, field: &str, place_id: &str) -> Result<bool, CacheError>;

    async fn mark_place_migrated(&self, field: &str, place_id: &str) -> Result<(), CacheError>;
}
