//! Upstream places adapter — the single point of entry for all geocoding and
//! places API calls.
//!
//! No other module may talk to the upstream API directly; everything goes
//! through [`MapsClient`] (or a test double implementing [`SearchClient`]).

pub mod geocode;
pub mod models;
pub mod nearby;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::poi::{Place, PlaceCategory};

const GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const NEARBY_URL: &str = "https://maps.googleapis.com/maps/api/place/nearbysearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Delay between successive pages of one location type; the upstream page
/// token takes about this long to become valid.
pub const NEARBY_PAGE_DELAY: Duration = Duration::from_secs(1);
/// Upper bound on pages fetched per location type.
pub const MAX_PAGES_PER_TYPE: u32 = 5;

#[derive(Debug, Error)]
pub enum MapsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream status {status}: {message}")]
    Api { status: String, message: String },

    #[error("geocoding returned no match")]
    NoGeocodeResult,

    #[error("nearby search deadline exceeded")]
    DeadlineExceeded,
}

/// Detail fields requested from the places details endpoint. An explicit
/// enumerated set rather than a comma-joined string so configuration
/// mistakes fail at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Name,
    OpeningHours,
    FormattedAddress,
    AdrAddress,
    Url,
    UserRatingsTotal,
    Photo,
}

impl DetailField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::OpeningHours => "opening_hours",
            Self::FormattedAddress => "formatted_address",
            Self::AdrAddress => "adr_address",
            Self::Url => "url",
            Self::UserRatingsTotal => "user_ratings_total",
            Self::Photo => "photo",
        }
    }

    /// The full supported set, used when configuration does not narrow it.
    pub fn all() -> Vec<DetailField> {
        vec![
            Self::Name,
            Self::OpeningHours,
            Self::FormattedAddress,
            Self::AdrAddress,
            Self::Url,
            Self::UserRatingsTotal,
            Self::Photo,
        ]
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "opening_hours" => Some(Self::OpeningHours),
            "formatted_address" => Some(Self::FormattedAddress),
            "adr_address" => Some(Self::AdrAddress),
            "url" => Some(Self::Url),
            "user_ratings_total" => Some(Self::UserRatingsTotal),
            "photo" => Some(Self::Photo),
            _ => None,
        }
    }
}

fn join_fields(fields: &[DetailField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// A city/country pair to resolve into coordinates. City names are matched
/// case-insensitively by the upstream, so queries are normalized to lowercase
/// before they are used as cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GeocodeQuery {
    pub city: String,
    pub country: String,
}

impl GeocodeQuery {
    pub fn new(city: &str, country: &str) -> Self {
        Self {
            city: city.trim().to_lowercase(),
            country: country.trim().to_lowercase(),
        }
    }
}

/// A resolved geocode. `city` carries the upstream-corrected canonical name,
/// which may differ from the queried spelling.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct Geocoded {
    pub lat: f64,
    pub lng: f64,
    pub city: String,
}

/// A nearby-search request produced by the planning layer.
#[derive(Debug, Clone)]
pub struct PlaceSearchRequest {
    /// `"city,country"` on entry; rewritten to `"lat,lng"` once resolved.
    pub location: String,
    pub category: PlaceCategory,
    /// Search radius in meters.
    pub radius: u32,
    /// Upstream ranking; defaults to `"prominence"` when empty.
    pub rank_by: String,
    pub max_results: usize,
    pub min_results: usize,
}

/// Outcome of a nearby search. On upstream failure or deadline expiry the
/// places collected so far are preserved alongside the error.
#[derive(Debug, Default)]
pub struct NearbyOutcome {
    pub places: Vec<Place>,
    pub error: Option<MapsError>,
}

/// Location-based operations the searcher depends on. Implemented by
/// [`MapsClient`] and by mocks in tests.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Translates a textual location to latitude/longitude plus the
    /// canonical city name.
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Geocoded, MapsError>;

    /// Searches nearby places in a category around a central location,
    /// stopping at `deadline`.
    async fn nearby_search(&self, request: &PlaceSearchRequest, deadline: Instant)
        -> NearbyOutcome;

    /// Fetches per-place enrichment for the configured detail fields.
    async fn place_details(
        &self,
        place_id: &str,
        fields: &[DetailField],
    ) -> Result<models::DetailsResult, MapsError>;
}

/// The shared upstream client. Holds one `reqwest::Client`; safe to use as a
/// stateless value from any task.
#[derive(Clone)]
pub struct MapsClient {
    http: reqwest::Client,
    api_key: String,
    detail_fields: Vec<DetailField>,
}

impl MapsClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build HTTP client"),
            api_key,
            detail_fields: DetailField::all(),
        }
    }

    /// Narrows the detail fields fetched during nearby-search enrichment.
    pub fn with_detail_fields(mut self, fields: Vec<DetailField>) -> Self {
        tracing::debug!(?fields, "detail search fields configured");
        self.detail_fields = fields;
        self
    }

    pub fn detail_fields(&self) -> &[DetailField] {
        &self.detail_fields
    }

    fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    pub async fn place_details(
        &self,
        place_id: &str,
        fields: &[DetailField],
    ) -> Result<models::DetailsResult, MapsError> {
        let start = std::time::Instant::now();
        let joined_fields = join_fields(fields);
        let response: models::DetailsResponse = self
            .http
            .get(DETAILS_URL)
            .query(&[
                ("place_id", place_id),
                ("fields", joined_fields.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if response.status != "OK" {
            return Err(MapsError::Api {
                status: response.status,
                message: format!("place details failed for {place_id}"),
            });
        }
        let result = response.result.unwrap_or_default();
        tracing::debug!(
            place_name = %result.name,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "place details fetched"
        );
        Ok(result)
    }
}

#[async_trait]
impl SearchClient for MapsClient {
    async fn geocode(&self, query: &GeocodeQuery) -> Result<Geocoded, MapsError> {
        geocode::geocode(self, query).await
    }

    async fn nearby_search(
        &self,
        request: &PlaceSearchRequest,
        deadline: Instant,
    ) -> NearbyOutcome {
        nearby::extensive_nearby_search(self, request, deadline).await
    }

    async fn place_details(
        &self,
        place_id: &str,
        fields: &[DetailField],
    ) -> Result<models::DetailsResult, MapsError> {
        MapsClient::place_details(self, place_id, fields).await
    }
}
