//! The place record persisted in the catalog.
//!
//! Coordinates follow the GeoJSON convention: `coordinates = [lng, lat]`
//! everywhere in persisted form. Opening hours are a fixed 7-entry array
//! indexed by [`Weekday`] (Monday = 0).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{BusinessStatus, LocationType, Weekday};

/// Photo reference from the upstream image service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacePhoto {
    pub reference: String,
    /// Maximum height of the image.
    pub height: u32,
    /// Maximum width of the image.
    pub width: u32,
}

/// GeoJSON point, `coordinates = [lng, lat]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: [f64; 2],
}

/// Structured postal address parsed from the upstream adr micro-format.
/// Fields absent in the fragment remain empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub po_box: String,
    pub extended_addr: String,
    pub street_addr: String,
    pub locality: String,
    pub region: String,
    pub postal_code: String,
    pub country: String,
}

static ADR_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<span class="([a-z-]+)">([^<]*)</span>"#).expect("adr span regex"));

impl Address {
    /// Parses an adr-address XML fragment, e.g.
    /// `<span class="street-address">450 National Ave</span>...`.
    /// An empty or unrecognized fragment yields all-empty fields.
    pub fn from_adr_fragment(fragment: &str) -> Self {
        let mut addr = Address::default();
        if fragment.is_empty() {
            return addr;
        }
        for caps in ADR_SPAN.captures_iter(fragment) {
            let value = caps[2].to_string();
            match &caps[1] {
                "post-office-box" => addr.po_box = value,
                "extended-address" => addr.extended_addr = value,
                "street-address" => addr.street_addr = value,
                "locality" => addr.locality = value,
                "region" => addr.region = value,
                "postal-code" => addr.postal_code = value,
                "country-name" => addr.country = value,
                _ => {}
            }
        }
        addr
    }
}

fn default_hours() -> [String; 7] {
    Default::default()
}

/// A point-of-interest as stored in the catalog, keyed by the upstream
/// `place_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(rename = "business_status", default)]
    pub status: BusinessStatus,
    pub location_type: LocationType,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub formatted_address: String,
    pub location: GeoPoint,
    #[serde(default)]
    pub price_level: u8,
    #[serde(default)]
    pub rating: f32,
    #[serde(default = "default_hours")]
    pub hours: [String; 7],
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub photo: PlacePhoto,
    #[serde(default)]
    pub user_ratings_total: u32,
}

impl Place {
    /// Builds a place from upstream fields. `latlng` is the upstream
    /// `"lat,lng"` pair; it is stored as GeoJSON `[lng, lat]`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        name: &str,
        latlng: &str,
        adr_address: &str,
        formatted_address: &str,
        location_type: LocationType,
        hours: &[String],
        id: &str,
        price_level: u8,
        rating: f32,
    ) -> Self {
        let mut place = Place {
            id: id.to_string(),
            name: name.to_string(),
            status: BusinessStatus::default(),
            location_type,
            address: Address::from_adr_fragment(adr_address),
            formatted_address: formatted_address.to_string(),
            location: GeoPoint::default(),
            price_level: 0,
            rating,
            hours: default_hours(),
            url: String::new(),
            photo: PlacePhoto::default(),
            user_ratings_total: 0,
        };
        if let Some((lat, lng)) = parse_lat_lng(latlng) {
            place.set_location(lat, lng);
        }
        place.set_price_level(price_level);
        for (idx, text) in hours.iter().take(7).enumerate() {
            place.hours[idx] = text.clone();
        }
        place
    }

    /// `[lng, lat]` in GeoJSON order.
    pub fn coordinates(&self) -> [f64; 2] {
        self.location.coordinates
    }

    pub fn hour_text(&self, day: Weekday) -> &str {
        &self.hours[day.index()]
    }

    pub fn set_location(&mut self, lat: f64, lng: f64) {
        self.location = GeoPoint {
            kind: "Point".to_string(),
            coordinates: [lng, lat],
        };
    }

    /// Clamps to the supported `[0, 4]` range; 0 means unknown.
    pub fn set_price_level(&mut self, level: u8) {
        self.price_level = level.min(4);
    }

    pub fn set_status(&mut self, raw: &str) {
        self.status = BusinessStatus::normalize(raw);
    }

    pub fn set_hour(&mut self, day: Weekday, text: impl Into<String>) {
        self.hours[day.index()] = text.into();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    pub fn set_user_ratings_total(&mut self, total: u32) {
        self.user_ratings_total = total;
    }

    pub fn set_photo(&mut self, reference: &str, width: u32, height: u32) {
        self.photo = PlacePhoto {
            reference: reference.to_string(),
            width,
            height,
        };
    }
}

/// Parses an upstream `"lat,lng"` pair.
pub fn parse_lat_lng(s: &str) -> Option<(f64, f64)> {
    let (lat, lng) = s.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lng = lng.trim().parse::<f64>().ok()?;
    Some((lat, lng))
}
