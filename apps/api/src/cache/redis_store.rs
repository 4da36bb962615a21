//! Redis implementation of [`PlaceCache`].
//!
//! A single `ConnectionManager` is shared process-wide; it multiplexes its
//! own connection and is cloned per operation. Cache operations carry no
//! deadline of their own; they run under the request context.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::maps::{Geocoded, GeocodeQuery};
use crate::poi::{Place, PlaceCategory};

use super::keys;
use super::{CacheError, PlaceCache};

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis; an unreachable server is a fatal init error for
    /// the service, surfaced to `main`.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("redis connection established");
        Ok(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// A handle for components that talk to Redis directly, such as the
    /// planning event writer.
    pub fn connection(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

#[async_trait]
impl PlaceCache for RedisCache {
    async fn get_geocode(&self, query: &GeocodeQuery) -> Result<Option<Geocoded>, CacheError> {
        let mut conn = self.conn();
        let raw: Option<String> = conn.get(keys::geocode_key(query)).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set_geocode(
        &self,
        original: &GeocodeQuery,
        geocoded: &Geocoded,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let value = serde_json::to_string(geocoded)?;
        let canonical = GeocodeQuery::new(&geocoded.city, &original.country);
        let _: () = conn.set(keys::geocode_key(&canonical), &value).await?;
        if canonical.city != original.city {
            // alias under the spelling the client actually sent
            let _: () = conn.set(keys::geocode_key(original), &value).await?;
        }
        Ok(())
    }

    async fn get_places(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
    ) -> Result<Vec<Place>, CacheError> {
        let mut conn = self.conn();
        let ids: Vec<String> = conn.smembers(keys::nearby_key(category, city, country)).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let detail_keys: Vec<String> = ids
            .iter()
            .map(|id| keys::place_detail_key(category, id))
            .collect();
        let raw: Vec<Option<String>> = conn.mget(&detail_keys).await?;

        let mut places = Vec::with_capacity(raw.len());
        for (id, value) in ids.iter().zip(raw) {
            match value {
                Some(json) => match serde_json::from_str::<Place>(&json) {
                    Ok(place) => places.push(place),
                    Err(err) => warn!(place_id = %id, error = %err, "corrupt place record skipped"),
                },
                // index entry without a detail record; tolerated as stale
                None => warn!(place_id = %id, "indexed place missing detail record"),
            }
        }
        Ok(places)
    }

    async fn set_places_on_category(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
        places: &[Place],
    ) {
        let index_key = keys::nearby_key(category, city, country);
        let writes = places.iter().map(|place| {
            let mut conn = self.conn();
            let index_key = index_key.clone();
            async move {
                let json = serde_json::to_string(place)?;
                let _: () = conn
                    .set(keys::place_detail_key(category, &place.id), json)
                    .await?;
                let _: () = conn.sadd(index_key, &place.id).await?;
                Ok::<_, CacheError>(())
            }
        });

        let mut stored = 0usize;
        for (place, result) in places.iter().zip(join_all(writes).await) {
            match result {
                Ok(()) => stored += 1,
                Err(err) => warn!(place_id = %place.id, error = %err, "place write-back failed"),
            }
        }
        info!(category = %category, city, stored, total = places.len(), "cache write-back complete");
    }

    async fn last_search_time(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
    ) -> Result<Option<DateTime<Utc>>, CacheError> {
        let mut conn = self.conn();
        let raw: Option<String> = conn
            .get(keys::last_search_key(category, city, country))
            .await?;
        Ok(raw
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|t| t.with_timezone(&Utc)))
    }

    async fn set_last_search_time(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
        when: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let _: () = conn
            .set(keys::last_search_key(category, city, country), when.to_rfc3339())
            .await?;
        Ok(())
    }

    async fn place_detail_keys(&self) -> Result<Vec<String>, CacheError> {
        let mut conn = self.conn();
        Ok(conn.keys("place_details:*").await?)
    }

    async fn place_count_by_category(
        &self,
        category: PlaceCategory,
    ) -> Result<u64, CacheError> {
        let mut conn = self.conn();
        let keys: Vec<String> = conn.keys(format!("place_details:{category}:*")).await?;
        Ok(keys.len() as u64)
    }

    async fn geocoded_cities(&self) -> Result<HashMap<String, String>, CacheError> {
        let mut conn = self.conn();
        let geocode_keys: Vec<String> = conn.keys("geocode:*").await?;
        let mut cities = HashMap::new();
        for key in geocode_keys {
            let Some((country, city)) = keys::parse_geocode_key(&key) else {
                continue;
            };
            let raw: Option<String> = conn.get(&key).await?;
            if let Some(geocoded) = raw.and_then(|s| serde_json::from_str::<Geocoded>(&s).ok()) {
                cities.insert(
                    format!("{city}, {country}"),
                    format!("{},{}", geocoded.lat, geocoded.lng),
                );
            }
        }
        Ok(cities)
    }

    async fn get_place_by_key(&self, key: &str) -> Result<Option<Place>, CacheError> {
        let mut conn = self.conn();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_place(&self, category: PlaceCategory, place: &Place) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let json = serde_json::to_string(place)?;
        let _: () = conn
            .set(keys::place_detail_key(category, &place.id), json)
            .await?;
        Ok(())
    }

    async fn is_place_migrated(&self, field: &str, place_id: &str) -> Result<bool, CacheError> {
        let mut conn = self.conn();
        Ok(conn.sismember(keys::migration_key(field), place_id).await?)
    }

    async fn mark_place_migrated(&self, field: &str, place_id: &str) -> Result<(), CacheError> {
        let mut conn = self.conn();
        let _: () = conn.sadd(keys::migration_key(field), place_id).await?;
        Ok(())
    }
}
