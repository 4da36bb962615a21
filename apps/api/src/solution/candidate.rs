//! Building and validating one candidate itinerary from an iterator tuple.

use std::collections::HashSet;

use serde::Serialize;

use crate::matching::{self, score};
use crate::poi::PlaceCategory;

/// Fallback link when a place record carries no url, so rendered plans
/// always have something to point at.
pub const FALLBACK_PLACE_URL: &str = "https://www.google.com/";

/// One ranked itinerary: parallel per-slot vectors plus the aggregate score.
/// `is_set` distinguishes a real solution from the incomplete sentinel
/// produced when a tuple repeats a place.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanningSolution {
    pub place_names: Vec<String>,
    pub place_ids: Vec<String>,
    /// `[lng, lat]` per place, GeoJSON order.
    pub place_locations: Vec<[f64; 2]>,
    pub place_addresses: Vec<String>,
    pub place_urls: Vec<String>,
    pub score: f64,
    pub is_set: bool,
}

/// A slot's candidate pool, partitioned by category.
#[derive(Debug, Clone, Default)]
pub struct CategorizedPlaces {
    pub visit_places: Vec<matching::Place>,
    pub eatery_places: Vec<matching::Place>,
}

impl CategorizedPlaces {
    pub fn pool(&self, category: PlaceCategory) -> &[matching::Place] {
        match category {
            PlaceCategory::Visit => &self.visit_places,
            PlaceCategory::Eatery => &self.eatery_places,
        }
    }
}

/// Assembles the itinerary selected by `status`, one index per slot.
/// Tuples that repeat a `place_id` across slots yield an unset solution.
pub fn create_candidate(
    slot_categories: &[PlaceCategory],
    status: &[usize],
    pools: &[CategorizedPlaces],
) -> PlanningSolution {
    let mut result = PlanningSolution::default();
    if status.len() != slot_categories.len() || pools.len() != slot_categories.len() {
        return result;
    }

    let mut seen = HashSet::new();
    let mut places = Vec::with_capacity(status.len());
    for ((&place_idx, &category), pool) in status.iter().zip(slot_categories).zip(pools) {
        let place = &pool.pool(category)[place_idx];
        if !seen.insert(place.id.clone()) {
            return PlanningSolution::default();
        }

        result.place_ids.push(place.id.clone());
        result.place_names.push(place.name.clone());
        result.place_locations.push(place.location);
        result.place_addresses.push(place.formatted_address.clone());
        let url = if place.url.trim().is_empty() {
            FALLBACK_PLACE_URL.to_string()
        } else {
            place.url.clone()
        };
        result.place_urls.push(url);
        places.push(place.clone());
    }

    result.score = score::score(&places);
    result.is_set = true;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::place::DayHours;

    fn match_place(id: &str, category: PlaceCategory, lng: f64) -> matching::Place {
        matching::Place {
            id: id.to_string(),
            name: format!("name-{id}"),
            location: [lng, 32.7],
            formatted_address: format!("{id} street"),
            url: String::new(),
            category,
            price_level: 2,
            rating: 4.0,
            user_ratings_count: 150,
            hours: [DayHours::ALL_DAY; 7],
        }
    }

    fn slot_pools() -> (Vec<PlaceCategory>, Vec<CategorizedPlaces>) {
        let categories = vec![PlaceCategory::Eatery, PlaceCategory::Visit];
        let pool = CategorizedPlaces {
            visit_places: vec![
                match_place("v1", PlaceCategory::Visit, -117.1),
                match_place("v2", PlaceCategory::Visit, -117.2),
            ],
            eatery_places: vec![match_place("e1", PlaceCategory::Eatery, -117.15)],
        };
        let pools = vec![pool.clone(), pool];
        (categories, pools)
    }

    #[test]
    fn test_candidate_assembled_in_slot_order() {
        let (categories, pools) = slot_pools();
        let candidate = create_candidate(&categories, &[0, 1], &pools);
        assert!(candidate.is_set);
        assert_eq!(candidate.place_ids, vec!["e1", "v2"]);
        assert_eq!(candidate.place_names, vec!["name-e1", "name-v2"]);
        assert_eq!(candidate.place_urls, vec![FALLBACK_PLACE_URL, FALLBACK_PLACE_URL]);
        assert!(candidate.score != 0.0);
    }

    #[test]
    fn test_duplicate_place_rejected() {
        let categories = vec![PlaceCategory::Visit, PlaceCategory::Visit];
        let pool = CategorizedPlaces {
            visit_places: vec![match_place("v1", PlaceCategory::Visit, -117.1)],
            eatery_places: Vec::new(),
        };
        let pools = vec![pool.clone(), pool];
        let candidate = create_candidate(&categories, &[0, 0], &pools);
        assert!(!candidate.is_set);
        assert!(candidate.place_ids.is_empty());
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let (categories, pools) = slot_pools();
        let candidate = create_candidate(&categories, &[0], &pools);
        assert!(!candidate.is_set);
    }

    #[test]
    fn test_existing_url_preserved() {
        let (categories, mut pools) = slot_pools();
        pools[0].eatery_places[0].url = "https://maps.google.com/?cid=5".to_string();
        let candidate = create_candidate(&categories, &[0, 0], &pools);
        assert_eq!(candidate.place_urls[0], "https://maps.google.com/?cid=5");
    }
}
