//! In-memory fakes for the cache and the upstream client, shared by the
//! searcher, solver and planner tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::cache::keys;
use crate::cache::{CacheError, PlaceCache};
use crate::maps::models::DetailsResult;
use crate::maps::{
    DetailField, Geocoded, GeocodeQuery, MapsError, NearbyOutcome, PlaceSearchRequest,
    SearchClient,
};
use crate::poi::{LocationType, Place, PlaceCategory};

pub fn mock_place(id: &str) -> Place {
    mock_place_at(id, 32.7157, -117.1611)
}

pub fn mock_place_at(id: &str, lat: f64, lng: f64) -> Place {
    let mut place = Place::create(
        &format!("place {id}"),
        &format!("{lat},{lng}"),
        "",
        &format!("{id} Example St"),
        LocationType::Museum,
        &["Monday: 8:00 AM – 9:00 PM".to_string()],
        id,
        2,
        4.2,
    );
    place.set_status("OPERATIONAL");
    place.set_user_ratings_total(300);
    place
}

/// In-memory [`PlaceCache`]. The nearby index keeps insertion order so test
/// assertions on capping are deterministic.
#[derive(Default)]
pub struct MemoryCache {
    geocodes: Mutex<HashMap<String, Geocoded>>,
    places: Mutex<HashMap<String, Place>>,
    nearby: Mutex<HashMap<String, Vec<String>>>,
    last_search: Mutex<HashMap<String, DateTime<Utc>>>,
    migrated: Mutex<HashMap<String, HashSet<String>>>,
}

impl MemoryCache {
    pub fn seed_geocode(&self, city: &str, country: &str, lat: f64, lng: f64) {
        let query = GeocodeQuery::new(city, country);
        self.geocodes.lock().unwrap().insert(
            keys::geocode_key(&query),
            Geocoded {
                lat,
                lng,
                city: query.city.clone(),
            },
        );
    }
}

#[async_trait]
impl PlaceCache for MemoryCache {
    async fn get_geocode(&self, query: &GeocodeQuery) -> Result<Option<Geocoded>, CacheError> {
        Ok(self
            .geocodes
            .lock()
            .unwrap()
            .get(&keys::geocode_key(query))
            .cloned())
    }

    async fn set_geocode(
        &self,
        original: &GeocodeQuery,
        geocoded: &Geocoded,
    ) -> Result<(), CacheError> {
        let mut geocodes = self.geocodes.lock().unwrap();
        let canonical = GeocodeQuery::new(&geocoded.city, &original.country);
        geocodes.insert(keys::geocode_key(&canonical), geocoded.clone());
        if canonical.city != original.city {
            geocodes.insert(keys::geocode_key(original), geocoded.clone());
        }
        Ok(())
    }

    async fn get_places(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
    ) -> Result<Vec<Place>, CacheError> {
        let nearby = self.nearby.lock().unwrap();
        let places = self.places.lock().unwrap();
        let ids = nearby
            .get(&keys::nearby_key(category, city, country))
            .cloned()
            .unwrap_or_default();
        Ok(ids
            .iter()
            .filter_map(|id| places.get(&keys::place_detail_key(category, id)).cloned())
            .collect())
    }

    async fn set_places_on_category(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
        new_places: &[Place],
    ) {
        let mut nearby = self.nearby.lock().unwrap();
        let mut places = self.places.lock().unwrap();
        let index = nearby
            .entry(keys::nearby_key(category, city, country))
            .or_default();
        for place in new_places {
            places.insert(keys::place_detail_key(category, &place.id), place.clone());
            if !index.contains(&place.id) {
                index.push(place.id.clone());
            }
        }
    }

    async fn last_search_time(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
    ) -> Result<Option<DateTime<Utc>>, CacheError> {
        Ok(self
            .last_search
            .lock()
            .unwrap()
            .get(&keys::last_search_key(category, city, country))
            .copied())
    }

    async fn set_last_search_time(
        &self,
        category: PlaceCategory,
        city: &str,
        country: &str,
        when: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        self.last_search
            .lock()
            .unwrap()
            .insert(keys::last_search_key(category, city, country), when);
        Ok(())
    }

    async fn place_detail_keys(&self) -> Result<Vec<String>, CacheError> {
        let mut detail_keys: Vec<String> = self.places.lock().unwrap().keys().cloned().collect();
        detail_keys.sort();
        Ok(detail_keys)
    }

    async fn place_count_by_category(
        &self,
        category: PlaceCategory,
    ) -> Result<u64, CacheError> {
        let prefix = format!("place_details:{category}:");
        Ok(self
            .places
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .count() as u64)
    }

    async fn geocoded_cities(&self) -> Result<HashMap<String, String>, CacheError> {
        Ok(self
            .geocodes
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, geocoded)| {
                let (country, city) = keys::parse_geocode_key(key)?;
                Some((
                    format!("{city}, {country}"),
                    format!("{},{}", geocoded.lat, geocoded.lng),
                ))
            })
            .collect())
    }

    async fn get_place_by_key(&self, key: &str) -> Result<Option<Place>, CacheError> {
        Ok(self.places.lock().unwrap().get(key).cloned())
    }

    async fn set_place(&self, category: PlaceCategory, place: &Place) -> Result<(), CacheError> {
        self.places
            .lock()
            .unwrap()
            .insert(keys::place_detail_key(category, &place.id), place.clone());
        Ok(())
    }

    async fn is_place_migrated(&self, field: &str, place_id: &str) -> Result<bool, CacheError> {
        Ok(self
            .migrated
            .lock()
            .unwrap()
            .get(field)
            .is_some_and(|set| set.contains(place_id)))
    }

    async fn mark_place_migrated(&self, field: &str, place_id: &str) -> Result<(), CacheError> {
        self.migrated
            .lock()
            .unwrap()
            .entry(field.to_string())
            .or_default()
            .insert(place_id.to_string());
        Ok(())
    }
}

/// Scripted [`SearchClient`] that records how it was called.
#[derive(Default)]
pub struct MockSearchClient {
    geocode_result: Option<Geocoded>,
    visit_places: Vec<Place>,
    eatery_places: Vec<Place>,
    details: Option<DetailsResult>,
    fail_nearby: bool,
    nearby_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    last_radius: Mutex<Option<u32>>,
}

impl MockSearchClient {
    pub fn with_places(places: Vec<Place>) -> Self {
        Self {
            visit_places: places.clone(),
            eatery_places: places,
            ..Default::default()
        }
    }

    pub fn with_category_places(visit: Vec<Place>, eatery: Vec<Place>) -> Self {
        Self {
            visit_places: visit,
            eatery_places: eatery,
            ..Default::default()
        }
    }

    pub fn with_geocode(geocoded: Geocoded) -> Self {
        Self {
            geocode_result: Some(geocoded),
            ..Default::default()
        }
    }

    pub fn with_details(details: DetailsResult) -> Self {
        Self {
            details: Some(details),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_nearby: true,
            ..Default::default()
        }
    }

    pub fn nearby_calls(&self) -> usize {
        self.nearby_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn last_radius(&self) -> Option<u32> {
        *self.last_radius.lock().unwrap()
    }
}

#[async_trait]
impl SearchClient for MockSearchClient {
    async fn geocode(&self, _query: &GeocodeQuery) -> Result<Geocoded, MapsError> {
        self.geocode_result
            .clone()
            .ok_or(MapsError::NoGeocodeResult)
    }

    async fn nearby_search(
        &self,
        request: &PlaceSearchRequest,
        _deadline: Instant,
    ) -> NearbyOutcome {
        self.nearby_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_radius.lock().unwrap() = Some(request.radius);
        if self.fail_nearby {
            return NearbyOutcome {
                places: Vec::new(),
                error: Some(MapsError::Api {
                    status: "OVER_QUERY_LIMIT".to_string(),
                    message: "scripted failure".to_string(),
                }),
            };
        }
        let places = match request.category {
            PlaceCategory::Visit => self.visit_places.clone(),
            PlaceCategory::Eatery => self.eatery_places.clone(),
        };
        NearbyOutcome {
            places,
            error: None,
        }
    }

    async fn place_details(
        &self,
        _place_id: &str,
        _fields: &[DetailField],
    ) -> Result<DetailsResult, MapsError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.details.clone().unwrap_or_default())
    }
}
