//! Cache key shapes. These are part of the external interface: other tooling
//! reads the same namespaces, so the formats here must stay stable.

use crate::maps::GeocodeQuery;
use crate::poi::PlaceCategory;

pub fn geocode_key(query: &GeocodeQuery) -> String {
    format!("geocode:{}:{}", query.country, query.city)
}

pub fn place_detail_key(category: PlaceCategory, place_id: &str) -> String {
    format!("place_details:{category}:{place_id}")
}

pub fn nearby_key(category: PlaceCategory, city: &str, country: &str) -> String {
    format!("nearby:{category}:{city}:{country}")
}

pub fn last_search_key(category: PlaceCategory, city: &str, country: &str) -> String {
    format!("last_search:{category}:{city}:{country}")
}

pub fn migration_key(field: &str) -> String {
    format!("migration:{field}")
}

/// Splits a `place_details:{category}:{place_id}` key back into its parts.
pub fn parse_place_detail_key(key: &str) -> Option<(PlaceCategory, &str)> {
    let mut parts = key.splitn(3, ':');
    if parts.next() != Some("place_details") {
        return None;
    }
    let category = match parts.next()? {
        "visit" => PlaceCategory::Visit,
        "eatery" => PlaceCategory::Eatery,
        _ => return None,
    };
    Some((category, parts.next()?))
}

/// Splits a `geocode:{country}:{city}` key back into `(country, city)`.
pub fn parse_geocode_key(key: &str) -> Option<(&str, &str)> {
    let mut parts = key.splitn(3, ':');
    if parts.next() != Some("geocode") {
        return None;
    }
    Some((parts.next()?, parts.next()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shapes() {
        let query = GeocodeQuery::new("San Diego", "USA");
        assert_eq!(geocode_key(&query), "geocode:usa:san diego");
        assert_eq!(
            place_detail_key(PlaceCategory::Eatery, "abc123"),
            "place_details:eatery:abc123"
        );
        assert_eq!(
            nearby_key(PlaceCategory::Visit, "san diego", "usa"),
            "nearby:visit:san diego:usa"
        );
        assert_eq!(
            last_search_key(PlaceCategory::Visit, "san diego", "usa"),
            "last_search:visit:san diego:usa"
        );
        assert_eq!(migration_key("url"), "migration:url");
    }

    #[test]
    fn test_parse_place_detail_key() {
        assert_eq!(
            parse_place_detail_key("place_details:visit:ChIJ123"),
            Some((PlaceCategory::Visit, "ChIJ123"))
        );
        assert_eq!(parse_place_detail_key("nearby:visit:x:y"), None);
        assert_eq!(parse_place_detail_key("place_details:hotel:ChIJ123"), None);
    }

    #[test]
    fn test_parse_geocode_key() {
        assert_eq!(
            parse_geocode_key("geocode:usa:san diego"),
            Some(("usa", "san diego"))
        );
        assert_eq!(parse_geocode_key("last_search:visit:a:b"), None);
    }
}
