//! Budget/time-constrained single-day selection.
//!
//! Items are places with `cost = price bucket` and `time = ceil(stay hours)`;
//! a place is eligible only when it is open for its whole stay starting at
//! the query start hour. V2 is the authoritative two-dimensional DP over
//! `(budget, time)`; the greedy V1 is kept for regression comparison.

use crate::poi::Weekday;

use super::place::Place;
use super::score::knapsack_place_score;

/// The day slice a knapsack query plans within.
#[derive(Debug, Clone, Copy)]
pub struct QueryTimeInterval {
    pub day: Weekday,
    pub start_hour: u8,
    pub end_hour: u8,
}

struct Item {
    idx: usize,
    cost: u32,
    time: u8,
    value: f64,
}

fn eligible_items(places: &[Place], interval: QueryTimeInterval) -> Vec<Item> {
    places
        .iter()
        .enumerate()
        .filter_map(|(idx, place)| {
            let time = place.stay_hours().ceil() as u8;
            let visit_end = interval.start_hour.checked_add(time)?;
            if visit_end > interval.end_hour {
                return None;
            }
            if !place.open_during(interval.day, interval.start_hour, visit_end) {
                return None;
            }
            Some(Item {
                idx,
                cost: u32::from(place.price_level),
                time,
                value: knapsack_place_score(place),
            })
        })
        .collect()
}

/// Greedy variant: highest-value items first, taken while both limits hold.
pub fn knapsack_v1(
    places: &[Place],
    interval: QueryTimeInterval,
    time_limit: u8,
    budget: u32,
) -> Vec<Place> {
    let mut items = eligible_items(places, interval);
    items.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));

    let mut remaining_budget = budget;
    let mut remaining_time = time_limit;
    let mut picked = Vec::new();
    for item in items {
        if item.cost <= remaining_budget && item.time <= remaining_time {
            remaining_budget -= item.cost;
            remaining_time -= item.time;
            picked.push(item.idx);
        }
    }
    picked.into_iter().map(|idx| places[idx].clone()).collect()
}

/// DP variant: maximizes total value under `Σ cost ≤ budget` and
/// `Σ time ≤ time_limit`. On equal value the earlier item set is kept, so
/// ties resolve to ascending item index. Returns the selection in item
/// order together with its totals.
pub fn knapsack(
    places: &[Place],
    interval: QueryTimeInterval,
    time_limit: u8,
    budget: u32,
) -> (Vec<Place>, u32, u8) {
    let items = eligible_items(places, interval);
    let budget_dim = budget as usize + 1;
    let time_dim = time_limit as usize + 1;

    let mut best = vec![vec![0.0_f64; time_dim]; budget_dim];
    let mut taken = vec![vec![vec![false; time_dim]; budget_dim]; items.len()];

    for (i, item) in items.iter().enumerate() {
        let cost = item.cost as usize;
        let time = item.time as usize;
        for b in (cost..budget_dim).rev() {
            for t in (time..time_dim).rev() {
                let candidate = best[b - cost][t - time] + item.value;
                if candidate > best[b][t] {
                    best[b][t] = candidate;
                    taken[i][b][t] = true;
                }
            }
        }
    }

    // walk the choice table backwards to recover the selection
    let mut b = budget as usize;
    let mut t = time_limit as usize;
    let mut selected = Vec::new();
    for i in (0..items.len()).rev() {
        if taken[i][b][t] {
            selected.push(i);
            b -= items[i].cost as usize;
            t -= items[i].time as usize;
        }
    }
    selected.reverse();

    let total_cost = selected.iter().map(|&i| items[i].cost).sum();
    let total_time = selected.iter().map(|&i| items[i].time).sum();
    let picked = selected
        .into_iter()
        .map(|i| places[items[i].idx].clone())
        .collect();
    (picked, total_cost, total_time)
}
