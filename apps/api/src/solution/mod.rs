//! The itinerary solver: enumerates slot-tuples over the candidate pools,
//! scores each complete candidate and keeps the top-K.

pub mod candidate;
pub mod iterator;

pub use candidate::{create_candidate, CategorizedPlaces, PlanningSolution, FALLBACK_PLACE_URL};
pub use iterator::MultiDimIterator;

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::maps::PlaceSearchRequest;
use crate::matching;
use crate::poi::{PlaceCategory, Weekday};
use crate::searcher::{PoiSearcher, SearchError};

/// Candidate pool size fetched per slot of a category.
pub const MAX_PLACES_PER_SLOT: usize = 4;
/// Upper bound on the pool fetched for one category in a day plan.
pub const MAX_PLACES_PER_DAY: usize = 12;
/// Plans returned when the request does not say otherwise.
pub const DEFAULT_NUM_PLANS: usize = 5;

/// One slot of the day, whole hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: u8,
    pub end: u8,
}

#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub category: PlaceCategory,
    pub window: TimeInterval,
}

#[derive(Debug, Clone)]
pub struct PlanningRequest {
    /// `"city,country"`.
    pub location: String,
    pub slots: Vec<SlotRequest>,
    pub weekday: Weekday,
    pub search_radius: u32,
    pub num_plans: usize,
}

/// The standard single-day plan: breakfast, a morning visit, lunch and an
/// afternoon visit.
pub fn standard_request(weekday: Weekday, num_plans: usize) -> PlanningRequest {
    let slots = vec![
        SlotRequest {
            category: PlaceCategory::Eatery,
            window: TimeInterval { start: 8, end: 9 },
        },
        SlotRequest {
            category: PlaceCategory::Visit,
            window: TimeInterval { start: 9, end: 12 },
        },
        SlotRequest {
            category: PlaceCategory::Eatery,
            window: TimeInterval { start: 12, end: 13 },
        },
        SlotRequest {
            category: PlaceCategory::Visit,
            window: TimeInterval { start: 13, end: 16 },
        },
    ];
    PlanningRequest {
        location: String::new(),
        slots,
        weekday,
        search_radius: 10_000,
        num_plans: if num_plans == 0 { DEFAULT_NUM_PLANS } else { num_plans },
    }
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error("invalid request location: {0}")]
    InvalidLocation(String),

    #[error("cannot find a valid solution")]
    NoValidSolution,

    #[error(transparent)]
    Search(#[from] SearchError),
}

pub struct Solver {
    searcher: Arc<PoiSearcher>,
}

impl Solver {
    pub fn new(searcher: Arc<PoiSearcher>) -> Self {
        Self { searcher }
    }

    pub fn searcher(&self) -> &Arc<PoiSearcher> {
        &self.searcher
    }

    /// Fetches the candidate pool for every category the request uses, then
    /// enumerates and scores slot-tuples, returning the top
    /// `request.num_plans` itineraries best-first.
    pub async fn solve(
        &self,
        request: &PlanningRequest,
    ) -> Result<Vec<PlanningSolution>, SolveError> {
        if request.slots.is_empty() {
            return Err(SolveError::NoValidSolution);
        }

        let mut slot_counts: HashMap<PlaceCategory, usize> = HashMap::new();
        for slot in &request.slots {
            *slot_counts.entry(slot.category).or_default() += 1;
        }

        let mut shared_pool = CategorizedPlaces::default();
        for (&category, &count) in &slot_counts {
            let mut search_request = PlaceSearchRequest {
                location: request.location.clone(),
                category,
                radius: request.search_radius,
                rank_by: String::new(),
                max_results: (MAX_PLACES_PER_SLOT * count).min(MAX_PLACES_PER_DAY),
                min_results: count,
            };
            let records = self
                .searcher
                .nearby_search(&mut search_request)
                .await
                .map_err(|err| match err {
                    SearchError::InvalidLocation(location) => {
                        SolveError::InvalidLocation(location)
                    }
                    other => SolveError::Search(other),
                })?;
            let lifted = records
                .iter()
                .map(|record| matching::Place::create(record, category))
                .collect();
            match category {
                PlaceCategory::Visit => shared_pool.visit_places = lifted,
                PlaceCategory::Eatery => shared_pool.eatery_places = lifted,
            }
        }

        let slot_categories: Vec<PlaceCategory> =
            request.slots.iter().map(|slot| slot.category).collect();
        let sizes: Vec<usize> = slot_categories
            .iter()
            .map(|&category| shared_pool.pool(category).len())
            .collect();
        let pools: Vec<CategorizedPlaces> = request
            .slots
            .iter()
            .map(|_| shared_pool.clone())
            .collect();

        let Some(mut iter) = MultiDimIterator::new(sizes) else {
            return Err(SolveError::NoValidSolution);
        };

        let mut top = TopSolutions::new(request.num_plans.max(1));
        loop {
            let candidate = create_candidate(&slot_categories, iter.status(), &pools);
            if candidate.is_set {
                top.push(candidate);
            }
            if !iter.advance() {
                break;
            }
        }

        let solutions = top.into_sorted_vec();
        if solutions.is_empty() {
            return Err(SolveError::NoValidSolution);
        }
        Ok(solutions)
    }
}

struct Ranked(PlanningSolution);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.0.score == other.0.score
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .partial_cmp(&other.0.score)
            .unwrap_or(Ordering::Equal)
    }
}

/// Bounded best-K collector: a min-heap that evicts its worst entry once
/// over capacity.
struct TopSolutions {
    limit: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopSolutions {
    fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit + 1),
        }
    }

    fn push(&mut self, solution: PlanningSolution) {
        self.heap.push(Reverse(Ranked(solution)));
        if self.heap.len() > self.limit {
            self.heap.pop();
        }
    }

    fn into_sorted_vec(self) -> Vec<PlanningSolution> {
        let mut solutions: Vec<PlanningSolution> =
            self.heap.into_iter().map(|entry| entry.0 .0).collect();
        solutions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        solutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::Place;
    use crate::test_support::{mock_place_at, MemoryCache, MockSearchClient};

    fn seeded_solver(visit: Vec<Place>, eatery: Vec<Place>) -> Solver {
        let cache = Arc::new(MemoryCache::default());
        cache.seed_geocode("san diego", "usa", 32.7157, -117.1611);
        let maps = Arc::new(MockSearchClient::with_category_places(visit, eatery));
        Solver::new(Arc::new(PoiSearcher::new(maps, cache)))
    }

    fn standard_for_city() -> PlanningRequest {
        let mut request = standard_request(Weekday::Saturday, 5);
        request.location = "san diego,usa".to_string();
        request
    }

    #[tokio::test]
    async fn test_solver_returns_ranked_unique_solutions() {
        let visit = vec![
            mock_place_at("v1", 32.70, -117.16),
            mock_place_at("v2", 32.71, -117.15),
            mock_place_at("v3", 32.72, -117.14),
        ];
        let eatery = vec![
            mock_place_at("e1", 32.70, -117.17),
            mock_place_at("e2", 32.73, -117.13),
        ];
        let solver = seeded_solver(visit, eatery);

        let solutions = solver.solve(&standard_for_city()).await.unwrap();
        assert!(!solutions.is_empty());
        assert!(solutions.len() <= 5);

        for solution in &solutions {
            assert!(solution.is_set);
            assert_eq!(solution.place_ids.len(), 4);
            // no place repeats inside an itinerary
            let unique: std::collections::HashSet<_> = solution.place_ids.iter().collect();
            assert_eq!(unique.len(), solution.place_ids.len());
        }
        // best-first ordering
        for pair in solutions.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_solver_caps_at_requested_plans() {
        let visit = vec![
            mock_place_at("v1", 32.70, -117.16),
            mock_place_at("v2", 32.71, -117.15),
            mock_place_at("v3", 32.72, -117.14),
        ];
        let eatery = vec![
            mock_place_at("e1", 32.70, -117.17),
            mock_place_at("e2", 32.73, -117.13),
        ];
        let solver = seeded_solver(visit, eatery);

        let mut request = standard_for_city();
        request.num_plans = 2;
        let solutions = solver.solve(&request).await.unwrap();
        assert_eq!(solutions.len(), 2);
    }

    #[tokio::test]
    async fn test_no_valid_solution_when_pool_too_small() {
        // two visit slots but a single visit place: every tuple repeats it
        let visit = vec![mock_place_at("v1", 32.70, -117.16)];
        let eatery = vec![
            mock_place_at("e1", 32.70, -117.17),
            mock_place_at("e2", 32.73, -117.13),
        ];
        let solver = seeded_solver(visit, eatery);

        let result = solver.solve(&standard_for_city()).await;
        assert!(matches!(result, Err(SolveError::NoValidSolution)));
    }

    #[tokio::test]
    async fn test_invalid_location_propagates() {
        let solver = seeded_solver(vec![], vec![]);
        let mut request = standard_for_city();
        request.location = "nowhere".to_string();
        let result = solver.solve(&request).await;
        assert!(matches!(result, Err(SolveError::InvalidLocation(_))));
    }
}
