//! Paged nearby search with concurrent detail enrichment.
//!
//! For each location type in the requested category, pages are chained
//! through upstream page tokens (sequential within a type); rounds over the
//! types repeat until enough results are collected or the page bound is hit.
//! Results missing opening hours are enriched through a bounded detail
//! fan-out before parsing.

use std::collections::{HashMap, HashSet};

use futures::future::join_all;
use tokio::time::Instant;

use crate::poi::{LocationType, Place};

use super::models::{NearbyResponse, SearchResult};
use super::{
    MapsClient, MapsError, NearbyOutcome, PlaceSearchRequest, MAX_PAGES_PER_TYPE,
    NEARBY_PAGE_DELAY, NEARBY_URL,
};

pub(super) async fn extensive_nearby_search(
    client: &MapsClient,
    request: &PlaceSearchRequest,
    deadline: Instant,
) -> NearbyOutcome {
    let rank_by = if request.rank_by.is_empty() {
        "prominence"
    } else {
        &request.rank_by
    };
    let location_types = request.category.location_types();

    // None = pages exhausted for this type; Some(token) = next page to fetch
    // ("" requests the first page).
    let mut page_tokens: HashMap<LocationType, Option<String>> = location_types
        .iter()
        .map(|ty| (*ty, Some(String::new())))
        .collect();

    let mut seen = HashSet::new();
    let mut adr_by_id = HashMap::new();
    let mut url_by_id = HashMap::new();
    let mut places = Vec::new();
    let mut first_error: Option<MapsError> = None;
    let started = std::time::Instant::now();

    'rounds: for round in 0..MAX_PAGES_PER_TYPE {
        for ty in location_types {
            let Some(token) = page_tokens.get(ty).cloned().flatten() else {
                continue;
            };
            if Instant::now() >= deadline {
                first_error.get_or_insert(MapsError::DeadlineExceeded);
                break 'rounds;
            }

            let mut page = match fetch_page(client, request, *ty, &token, rank_by).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(location_type = %ty, error = %err, "nearby page failed");
                    page_tokens.insert(*ty, None);
                    first_error.get_or_insert(err);
                    continue;
                }
            };

            enrich_missing_details(client, &mut page.results, &mut adr_by_id, &mut url_by_id)
                .await;
            places.extend(parse_search_results(
                page.results,
                *ty,
                &adr_by_id,
                &url_by_id,
                &mut seen,
            ));
            page_tokens.insert(*ty, page.next_page_token.filter(|t| !t.is_empty()));
        }

        if places.len() >= request.min_results {
            break;
        }
        if page_tokens.values().all(Option::is_none) {
            break;
        }
        if round + 1 < MAX_PAGES_PER_TYPE {
            // New page tokens need a moment to become valid.
            tokio::time::sleep(NEARBY_PAGE_DELAY).await;
        }
    }

    tracing::info!(
        location = %request.location,
        category = %request.category,
        total_results = places.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "nearby search finished"
    );

    NearbyOutcome {
        places,
        error: first_error,
    }
}

async fn fetch_page(
    client: &MapsClient,
    request: &PlaceSearchRequest,
    location_type: LocationType,
    page_token: &str,
    rank_by: &str,
) -> Result<NearbyResponse, MapsError> {
    let radius = request.radius.to_string();
    let mut query = vec![
        ("location", request.location.as_str()),
        ("radius", radius.as_str()),
        ("type", location_type.as_str()),
        ("rankby", rank_by),
        ("key", client.api_key()),
    ];
    if !page_token.is_empty() {
        query.push(("pagetoken", page_token));
    }

    let response: NearbyResponse = client
        .http()
        .get(NEARBY_URL)
        .query(&query)
        .send()
        .await?
        .json()
        .await?;

    match response.status.as_str() {
        "OK" | "ZERO_RESULTS" => Ok(response),
        status => Err(MapsError::Api {
            status: status.to_string(),
            message: format!("nearby search failed for type {location_type}"),
        }),
    }
}

/// Fills opening hours, addresses, urls, photos and rating counts for every
/// result of a page that lacks weekday text. One detail call per such result,
/// joined before parsing; individual failures are logged and skipped.
async fn enrich_missing_details(
    client: &MapsClient,
    results: &mut [SearchResult],
    adr_by_id: &mut HashMap<String, String>,
    url_by_id: &mut HashMap<String, String>,
) {
    let missing: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            r.opening_hours
                .as_ref()
                .and_then(|h| h.weekday_text.as_ref())
                .is_none()
        })
        .map(|(idx, _)| idx)
        .collect();
    if missing.is_empty() {
        return;
    }

    let place_ids: Vec<String> = missing
        .iter()
        .map(|&idx| results[idx].place_id.clone())
        .collect();
    let lookups = place_ids
        .iter()
        .map(|place_id| client.place_details(place_id, client.detail_fields()));
    let fetched = join_all(lookups).await;

    for (&idx, details) in missing.iter().zip(fetched) {
        let result = &mut results[idx];
        match details {
            Ok(details) => {
                result.opening_hours = details.opening_hours;
                if result.formatted_address.is_empty() {
                    result.formatted_address = details.formatted_address;
                }
                if result.user_ratings_total.is_none() {
                    result.user_ratings_total = details.user_ratings_total;
                }
                if result.photos.is_empty() {
                    result.photos = details.photos;
                }
                adr_by_id.insert(result.place_id.clone(), details.adr_address);
                url_by_id.insert(result.place_id.clone(), details.url);
            }
            Err(err) => {
                tracing::warn!(place_id = %result.place_id, error = %err, "place details failed");
            }
        }
    }
}

/// Converts a page of search results into place records. Duplicate
/// `place_id`s across pages and types are dropped on a first-seen basis.
fn parse_search_results(
    results: Vec<SearchResult>,
    location_type: LocationType,
    adr_by_id: &HashMap<String, String>,
    url_by_id: &HashMap<String, String>,
    seen: &mut HashSet<String>,
) -> Vec<Place> {
    let mut places = Vec::new();
    for result in results {
        if !seen.insert(result.place_id.clone()) {
            continue;
        }
        let latlng = format!(
            "{},{}",
            result.geometry.location.lat, result.geometry.location.lng
        );
        let hours = result
            .opening_hours
            .as_ref()
            .and_then(|h| h.weekday_text.clone())
            .unwrap_or_default();
        let adr = adr_by_id
            .get(&result.place_id)
            .map(String::as_str)
            .unwrap_or("");

        let mut place = Place::create(
            &result.name,
            &latlng,
            adr,
            &result.formatted_address,
            location_type,
            &hours,
            &result.place_id,
            result.price_level.unwrap_or(0),
            result.rating.unwrap_or(0.0),
        );
        place.set_status(result.business_status.as_deref().unwrap_or(""));
        if let Some(url) = url_by_id.get(&result.place_id) {
            place.set_url(url.clone());
        }
        if let Some(total) = result.user_ratings_total {
            place.set_user_ratings_total(total);
        }
        if let Some(photo) = result.photos.first() {
            place.set_photo(&photo.photo_reference, photo.width, photo.height);
        }
        places.push(place);
    }
    places
}
