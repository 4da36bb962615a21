//! Wire types for the upstream geocoding and places API responses.
//!
//! Only the fields the pipeline consumes are modeled; everything else in the
//! upstream payload is ignored during deserialization.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub geometry: Geometry,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningHours {
    pub weekday_text: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    pub photo_reference: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub width: u32,
}

#[derive(Debug, Deserialize)]
pub struct NearbyResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    pub next_page_token: Option<String>,
}

/// One entry of a nearby-search page.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    pub geometry: Geometry,
    pub opening_hours: Option<OpeningHours>,
    pub price_level: Option<u8>,
    pub rating: Option<f32>,
    pub user_ratings_total: Option<u32>,
    pub business_status: Option<String>,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsResponse {
    pub status: String,
    pub result: Option<DetailsResult>,
}

/// Per-place enrichment returned by the details endpoint. Which fields are
/// populated depends on the requested [`DetailField`](super::DetailField) set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailsResult {
    #[serde(default)]
    pub name: String,
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub adr_address: String,
    #[serde(default)]
    pub url: String,
    pub user_ratings_total: Option<u32>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}
