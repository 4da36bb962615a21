//! POI domain types: the place record, category taxonomy and weekday model.

pub mod place;

pub use place::{Address, GeoPoint, Place, PlacePhoto};

use serde::{Deserialize, Serialize};

/// Days of the week, Monday-first. Used to index the 7-entry hours array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Weekday {
    Monday = 0,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Parses a 0-based (Monday=0) day index; out-of-range values are rejected.
    pub fn from_index(idx: u8) -> Option<Self> {
        match idx {
            0 => Some(Self::Monday),
            1 => Some(Self::Tuesday),
            2 => Some(Self::Wednesday),
            3 => Some(Self::Thursday),
            4 => Some(Self::Friday),
            5 => Some(Self::Saturday),
            6 => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// User-facing place categories. Each category expands into a set of
/// upstream location types (see [`PlaceCategory::location_types`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Visit,
    Eatery,
}

impl PlaceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visit => "visit",
            Self::Eatery => "eatery",
        }
    }

    /// Upstream location types searched for this category.
    pub fn location_types(self) -> &'static [LocationType] {
        match self {
            Self::Visit => &[
                LocationType::Park,
                LocationType::AmusementPark,
                LocationType::ArtGallery,
                LocationType::Museum,
            ],
            Self::Eatery => &[LocationType::Cafe, LocationType::Restaurant],
        }
    }
}

impl std::fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream location types. `Stay` remains in the catalog for legacy lodging
/// records but maps into no planning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    Park,
    AmusementPark,
    ArtGallery,
    Museum,
    Cafe,
    Restaurant,
    Stay,
}

impl LocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Park => "park",
            Self::AmusementPark => "amusement_park",
            Self::ArtGallery => "art_gallery",
            Self::Museum => "museum",
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Stay => "stay",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "park" => Some(Self::Park),
            "amusement_park" => Some(Self::AmusementPark),
            "art_gallery" => Some(Self::ArtGallery),
            "museum" => Some(Self::Museum),
            "cafe" => Some(Self::Cafe),
            "restaurant" => Some(Self::Restaurant),
            "stay" => Some(Self::Stay),
            _ => None,
        }
    }
}

impl std::fmt::Display for LocationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operating status reported by the upstream places API. Anything outside the
/// known set normalizes to `StatusNotAvailable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BusinessStatus {
    #[serde(rename = "OPERATIONAL")]
    Operational,
    #[serde(rename = "CLOSED_TEMPORARILY")]
    ClosedTemporarily,
    #[serde(rename = "CLOSED_PERMANENTLY")]
    ClosedPermanently,
    #[serde(rename = "STATUS_NOT_AVAILABLE")]
    #[default]
    StatusNotAvailable,
}

impl BusinessStatus {
    pub fn normalize(raw: &str) -> Self {
        match raw {
            "OPERATIONAL" => Self::Operational,
            "CLOSED_TEMPORARILY" => Self::ClosedTemporarily,
            "CLOSED_PERMANENTLY" => Self::ClosedPermanently,
            _ => Self::StatusNotAvailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_monday_first() {
        assert_eq!(Weekday::from_index(0), Some(Weekday::Monday));
        assert_eq!(Weekday::from_index(6), Some(Weekday::Sunday));
        assert_eq!(Weekday::from_index(7), None);
        assert_eq!(Weekday::Saturday.index(), 5);
    }

    #[test]
    fn test_category_location_types() {
        assert_eq!(PlaceCategory::Visit.location_types().len(), 4);
        assert_eq!(
            PlaceCategory::Eatery.location_types(),
            &[LocationType::Cafe, LocationType::Restaurant]
        );
    }

    #[test]
    fn test_status_normalization() {
        assert_eq!(
            BusinessStatus::normalize("OPERATIONAL"),
            BusinessStatus::Operational
        );
        assert_eq!(
            BusinessStatus::normalize("UNKNOWN"),
            BusinessStatus::StatusNotAvailable
        );
    }

    #[test]
    fn test_location_type_round_trip() {
        for raw in [
            "park",
            "amusement_park",
            "art_gallery",
            "museum",
            "cafe",
            "restaurant",
            "stay",
        ] {
            let parsed = LocationType::parse(raw).unwrap();
            assert_eq!(parsed.as_str(), raw);
        }
        assert_eq!(LocationType::parse("zoo"), None);
    }
}
