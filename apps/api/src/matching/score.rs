//! Itinerary and single-place scoring.
//!
//! The distance-aware score rewards highly rated, well reviewed, cheap
//! places and penalizes itineraries whose successive legs are long relative
//! to the longest leg. Distances use the Haversine formula on the WGS84
//! sphere.

use geo::{Distance, Haversine, Point};

use super::place::Place;

/// Fallback rating for places without one.
pub const AVG_RATING: f64 = 3.0;
/// Fallback price bucket when the price level is unknown (0).
pub const AVG_PRICING: f64 = 2.0;

/// Distance-aware itinerary score: mean single-place score minus the mean
/// leg distance normalized by the longest leg. Order-sensitive through the
/// distance term.
pub fn score(places: &[Place]) -> f64 {
    match places {
        [] => 0.0,
        [single] => single_place_score(single),
        _ => {
            let distances = successive_distances(places);
            let max_dist = distances.iter().copied().fold(0.001_f64, f64::max);
            let avg_norm_dist = mean(&distances) / max_dist;
            let avg_score = places.iter().map(single_place_score).sum::<f64>()
                / places.len() as f64;
            avg_score - avg_norm_dist
        }
    }
}

/// Distance-free score used by the budget/time planner: the sum of the
/// knapsack per-place scores.
pub fn score_no_distance(places: &[Place]) -> f64 {
    match places {
        [single] => single_place_score(single),
        _ => places.iter().map(knapsack_place_score).sum(),
    }
}

/// `log10(1 + user_ratings_count) × (rating / price)`, with the average
/// rating/price ratio standing in when the price is unknown.
pub fn single_place_score(place: &Place) -> f64 {
    let rating_pricing_ratio = if place.price() == 0.0 {
        AVG_RATING / AVG_PRICING
    } else {
        f64::from(place.rating) / place.price()
    };
    (1.0 + f64::from(place.user_ratings_count)).log10() * rating_pricing_ratio
}

/// Knapsack item value: `log10(1.25 + user_ratings_count) × rating`.
/// No price compensation; the price is already the knapsack cost.
pub fn knapsack_place_score(place: &Place) -> f64 {
    (1.25 + f64::from(place.user_ratings_count)).log10() * f64::from(place.rating)
}

/// Haversine distances between successive places, in meters.
fn successive_distances(places: &[Place]) -> Vec<f64> {
    places
        .windows(2)
        .map(|pair| {
            let a = Point::new(pair[0].location[0], pair[0].location[1]);
            let b = Point::new(pair[1].location[0], pair[1].location[1]);
            Haversine::distance(a, b)
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
