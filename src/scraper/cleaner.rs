//! Text normalisation for raw listing fields.

use crate::config::FreshnessMarkers;
use crate::models::ListingDate;
use chrono::{Days, NaiveDate};

// ── Freshness ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Today,
    Yesterday,
    NotRecent,
}

impl Freshness {
    pub fn is_recent(self) -> bool {
        !matches!(self, Freshness::NotRecent)
    }
}

/// Turns freshness phrases ("2 giờ trước", "hôm qua") into calendar days.
#[derive(Debug, Clone)]
pub struct DateClassifier {
    markers: FreshnessMarkers,
}

impl DateClassifier {
    pub fn new(markers: FreshnessMarkers) -> Self {
        Self { markers }
    }

    /// Expects an already lowercased phrase.
    pub fn classify(&self, phrase: &str) -> Freshness {
        let m = &self.markers;
        if contains_any(phrase, &m.today)
            || contains_any(phrase, &m.hours_ago)
            || contains_any(phrase, &m.minutes_ago)
        {
            Freshness::Today
        } else if contains_any(phrase, &m.yesterday) {
            Freshness::Yesterday
        } else {
            Freshness::NotRecent
        }
    }

    /// Date value stored for a phrase, relative to `today`.
    pub fn resolve(&self, phrase: &str, today: NaiveDate) -> (Freshness, ListingDate) {
        let freshness = self.classify(phrase);
        let date = match freshness {
            Freshness::Today => ListingDate::Calendar(today),
            Freshness::Yesterday => today
                .checked_sub_days(Days::new(1))
                .map(ListingDate::Calendar)
                .unwrap_or_else(|| ListingDate::Text(phrase.to_string())),
            Freshness::NotRecent => ListingDate::Text(phrase.to_string()),
        };
        (freshness, date)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| !n.is_empty() && haystack.contains(n.as_str()))
}

// ── Parsers ───────────────────────────────────────────────────────────────────

/// Trim and lowercase, the form every comparison runs on.
pub fn normalise_text(s: &str) -> String {
    s.trim().to_lowercase()
}

/// First run of ASCII digits in the text.
/// "3 tin đăng" → Some(3) | "Đăng 12 tin" → Some(12) | "—" → None
pub fn parse_first_int(s: &str) -> Option<u32> {
    let start = s.find(|c: char| c.is_ascii_digit())?;
    let digits: String = s[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    // Runs too long for u32 are still "many".
    Some(digits.parse().unwrap_or(u32::MAX))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
