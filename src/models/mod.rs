use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const DATE_FORMAT: &str = "%d/%m/%Y";

// ── Listing ───────────────────────────────────────────────────────────────────

/// One accepted entry of the feed. `url` is the identity key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    #[serde(rename = "Date")]
    pub date: ListingDate,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "URL")]
    pub url: String,
}

/// Either a resolved calendar day or the feed's own phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingDate {
    Calendar(NaiveDate),
    Text(String),
}

impl ListingDate {
    /// Reads a stored cell back; anything that is not `DD/MM/YYYY` stays text.
    pub fn from_cell(cell: &str) -> Self {
        match NaiveDate::parse_from_str(cell.trim(), DATE_FORMAT) {
            Ok(d) => ListingDate::Calendar(d),
            Err(_) => ListingDate::Text(cell.to_string()),
        }
    }

    pub fn calendar(&self) -> Option<NaiveDate> {
        match self {
            ListingDate::Calendar(d) => Some(*d),
            ListingDate::Text(_) => None,
        }
    }
}

impl fmt::Display for ListingDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingDate::Calendar(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            ListingDate::Text(t) => f.write_str(t),
        }
    }
}

impl Serialize for ListingDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ListingDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cell = String::deserialize(deserializer)?;
        Ok(ListingDate::from_cell(&cell))
    }
}

// ── Raw item ──────────────────────────────────────────────────────────────────

/// Fields read from one listing element, before any filtering.
#[derive(Debug, Clone, Default)]
pub struct RawItem {
    pub url: Option<String>,
    pub freshness_text: Option<String>,
    pub location_text: Option<String>,
    pub duplicate_count_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_dates_render_day_first() {
        let d = ListingDate::Calendar(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(d.to_string(), "09/03/2024");
        assert_eq!(ListingDate::from_cell("09/03/2024"), d);
    }

    #[test]
    fn unparsable_cells_stay_text() {
        let d = ListingDate::from_cell("2 tuần trước");
        assert_eq!(d, ListingDate::Text("2 tuần trước".into()));
        assert_eq!(d.calendar(), None);
    }
}
