//! Match-eligible places: a catalog record plus the features scoring needs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::poi::{self, PlaceCategory, Weekday};

/// Default stay durations per category, in hours.
pub fn stay_duration_hours(category: PlaceCategory) -> f64 {
    match category {
        PlaceCategory::Visit => 3.0,
        PlaceCategory::Eatery => 1.0,
    }
}

/// Opening interval for one weekday, whole hours in `0..=24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayHours {
    pub start: u8,
    pub end: u8,
}

impl DayHours {
    /// Open all day; also the fallback for unparseable hour text.
    pub const ALL_DAY: DayHours = DayHours { start: 0, end: 24 };
}

static HOUR_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*(AM|PM)").expect("hour regex"));

/// Parses an upstream weekday text such as `"Monday: 8:00 AM – 9:00 PM"`
/// into whole start/end hours. Text without two parseable times (closed
/// days, "Open 24 hours", free-form notes) is treated as open all day.
pub fn parse_day_hours(text: &str) -> DayHours {
    let mut times = HOUR_TEXT.captures_iter(text).map(|caps| {
        let hour: u8 = caps[1].parse().unwrap_or(0);
        let hour = hour % 12;
        match &caps[3] {
            "PM" => hour + 12,
            _ => hour,
        }
    });
    let (Some(start), Some(end)) = (times.next(), times.next()) else {
        return DayHours::ALL_DAY;
    };
    // closing past midnight clamps to end-of-day
    let end = if end <= start { 24 } else { end };
    DayHours { start, end }
}

/// A place lifted out of the catalog for matching, carrying the derived
/// features the scorer and solver consume.
#[derive(Debug, Clone)]
pub struct Place {
    pub id: String,
    pub name: String,
    /// `[lng, lat]`, GeoJSON order as persisted.
    pub location: [f64; 2],
    pub formatted_address: String,
    pub url: String,
    pub category: PlaceCategory,
    pub price_level: u8,
    pub rating: f32,
    pub user_ratings_count: u32,
    pub hours: [DayHours; 7],
}

impl Place {
    pub fn create(record: &poi::Place, category: PlaceCategory) -> Self {
        let mut hours = [DayHours::ALL_DAY; 7];
        for (idx, text) in record.hours.iter().enumerate() {
            hours[idx] = parse_day_hours(text);
        }
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            location: record.coordinates(),
            formatted_address: record.formatted_address.clone(),
            url: record.url.clone(),
            category,
            price_level: record.price_level,
            rating: record.rating,
            user_ratings_count: record.user_ratings_total,
            hours,
        }
    }

    /// Price bucket as a scoring value; 0 means unknown.
    pub fn price(&self) -> f64 {
        f64::from(self.price_level)
    }

    /// Whether the place is open for the whole `[from, to]` interval on the
    /// given day.
    pub fn open_during(&self, day: Weekday, from: u8, to: u8) -> bool {
        let hours = self.hours[day.index()];
        from >= hours.start && to <= hours.end
    }

    pub fn stay_hours(&self) -> f64 {
        stay_duration_hours(self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poi::LocationType;

    #[test]
    fn test_parse_day_hours() {
        assert_eq!(
            parse_day_hours("Monday: 8:00 AM – 9:00 PM"),
            DayHours { start: 8, end: 21 }
        );
        assert_eq!(
            parse_day_hours("Tuesday: 12:00 PM – 11:30 PM"),
            DayHours { start: 12, end: 23 }
        );
        // midnight close clamps to 24
        assert_eq!(
            parse_day_hours("Friday: 5:00 PM – 12:00 AM"),
            DayHours { start: 17, end: 24 }
        );
    }

    #[test]
    fn test_unparseable_hours_mean_open_all_day() {
        assert_eq!(parse_day_hours(""), DayHours::ALL_DAY);
        assert_eq!(parse_day_hours("Sunday: Closed"), DayHours::ALL_DAY);
        assert_eq!(parse_day_hours("Monday: Open 24 hours"), DayHours::ALL_DAY);
    }

    #[test]
    fn test_lift_record() {
        let mut record = poi::Place::create(
            "museum of us",
            "32.731,-117.15",
            "",
            "1350 El Prado",
            LocationType::Museum,
            &["Monday: 10:00 AM – 5:00 PM".to_string()],
            "m1",
            2,
            4.6,
        );
        record.set_user_ratings_total(8000);
        let place = Place::create(&record, PlaceCategory::Visit);
        assert_eq!(place.location, [-117.15, 32.731]);
        assert_eq!(place.hours[0], DayHours { start: 10, end: 17 });
        assert_eq!(place.hours[1], DayHours::ALL_DAY);
        assert!(place.open_during(Weekday::Monday, 10, 13));
        assert!(!place.open_during(Weekday::Monday, 9, 12));
        assert_eq!(place.price(), 2.0);
    }
}
