//! Acceptance rules for one listing.

use crate::config::FilterConfig;
use crate::models::{Listing, RawItem};
use crate::pipeline::dedup::Deduplicator;
use crate::scraper::cleaner::{normalise_text, parse_first_int, DateClassifier};
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    MissingUrl,
    AlreadySeen,
    MissingFreshness,
    NotRecent,
    MissingLocation,
    OutsideDistricts,
    TooManyPosts(u32),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::MissingUrl => f.write_str("no link"),
            Rejection::AlreadySeen => f.write_str("already collected"),
            Rejection::MissingFreshness => f.write_str("no freshness text"),
            Rejection::NotRecent => f.write_str("not recent"),
            Rejection::MissingLocation => f.write_str("no location"),
            Rejection::OutsideDistricts => f.write_str("location not allowed"),
            Rejection::TooManyPosts(n) => write!(f, "poster has {} listings", n),
        }
    }
}

/// Result of running one item through the filter.
///
/// `recent` is reported even when a later check rejects the item; the
/// crawl loop needs it for the stale-page count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub recent: bool,
    pub outcome: Result<Listing, Rejection>,
}

impl Verdict {
    fn reject(recent: bool, why: Rejection) -> Self {
        Self { recent, outcome: Err(why) }
    }
}

pub struct ItemFilter {
    classifier: DateClassifier,
    districts: Vec<String>,
    duplicate_ceiling: u32,
}

impl ItemFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            classifier: DateClassifier::new(config.markers.clone()),
            districts: config
                .districts
                .iter()
                .map(|d| normalise_text(d))
                .filter(|d| !d.is_empty())
                .collect(),
            duplicate_ceiling: config.duplicate_ceiling,
        }
    }

    /// Checks run cheapest first and stop at the first failure.
    pub fn evaluate(&self, item: &RawItem, seen: &Deduplicator, today: NaiveDate) -> Verdict {
        let Some(url) = item.url.as_deref() else {
            return Verdict::reject(false, Rejection::MissingUrl);
        };
        if seen.has(url) {
            return Verdict::reject(false, Rejection::AlreadySeen);
        }

        let Some(freshness) = item.freshness_text.as_deref() else {
            return Verdict::reject(false, Rejection::MissingFreshness);
        };
        let freshness = normalise_text(freshness);
        let (verdict, date) = self.classifier.resolve(&freshness, today);
        if !verdict.is_recent() {
            return Verdict::reject(false, Rejection::NotRecent);
        }

        let Some(location) = item.location_text.as_deref() else {
            return Verdict::reject(true, Rejection::MissingLocation);
        };
        let location = normalise_text(location);
        if !self.districts.iter().any(|d| location.contains(d.as_str())) {
            return Verdict::reject(true, Rejection::OutsideDistricts);
        }

        let posts = item
            .duplicate_count_text
            .as_deref()
            .and_then(parse_first_int)
            .unwrap_or(0);
        if posts > self.duplicate_ceiling {
            return Verdict::reject(true, Rejection::TooManyPosts(posts));
        }

        Verdict {
            recent: true,
            outcome: Ok(Listing {
                date,
                location,
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    fn good_item() -> RawItem {
        RawItem {
            url: Some("https://x.vn/1.htm".into()),
            freshness_text: Some("2 Giờ trước".into()),
            location_text: Some("Phường Dịch Vọng, Quận Cầu Giấy".into()),
            duplicate_count_text: Some("3 tin đăng".into()),
        }
    }

    #[test]
    fn accepts_item_passing_every_check() {
        let filter = ItemFilter::new(&FilterConfig::default());
        let v = filter.evaluate(&good_item(), &Deduplicator::new(), today());

        assert!(v.recent);
        assert_eq!(
            v.outcome,
            Ok(Listing {
                date: ListingDate::Calendar(today()),
                location: "phường dịch vọng, quận cầu giấy".into(),
                url: "https://x.vn/1.htm".into(),
            })
        );
    }

    #[test]
    fn each_failed_check_flips_acceptance() {
        let filter = ItemFilter::new(&FilterConfig::default());
        let mut seen = Deduplicator::new();
        seen.add("https://x.vn/seen.htm");

        type Mutate = fn(&mut RawItem);
        let cases: [(&str, Mutate, bool, Rejection); 7] = [
            ("no url", |i| i.url = None, false, Rejection::MissingUrl),
            (
                "seen url",
                |i| i.url = Some("https://x.vn/seen.htm".into()),
                false,
                Rejection::AlreadySeen,
            ),
            ("no freshness", |i| i.freshness_text = None, false, Rejection::MissingFreshness),
            (
                "old",
                |i| i.freshness_text = Some("3 ngày trước".into()),
                false,
                Rejection::NotRecent,
            ),
            ("no location", |i| i.location_text = None, true, Rejection::MissingLocation),
            (
                "other district",
                |i| i.location_text = Some("Quận Long Biên".into()),
                true,
                Rejection::OutsideDistricts,
            ),
            (
                "too many posts",
                |i| i.duplicate_count_text = Some("4 tin đăng".into()),
                true,
                Rejection::TooManyPosts(4),
            ),
        ];

        for (name, mutate, recent, why) in cases {
            let mut item = good_item();
            mutate(&mut item);
            let v = filter.evaluate(&item, &seen, today());
            assert_eq!(v.outcome, Err(why), "{name}");
            assert_eq!(v.recent, recent, "{name}");
        }
    }

    #[test]
    fn missing_or_garbled_count_is_zero() {
        let filter = ItemFilter::new(&FilterConfig::default());
        for count in [None, Some("không rõ".to_string())] {
            let item = RawItem {
                duplicate_count_text: count,
                ..good_item()
            };
            assert!(filter.evaluate(&item, &Deduplicator::new(), today()).outcome.is_ok());
        }
    }

    #[test]
    fn yesterday_is_recent_with_previous_date() {
        let filter = ItemFilter::new(&FilterConfig::default());
        let item = RawItem {
            freshness_text: Some("Hôm qua".into()),
            ..good_item()
        };
        let listing = filter
            .evaluate(&item, &Deduplicator::new(), today())
            .outcome
            .unwrap();
        assert_eq!(listing.date.to_string(), "09/03/2024");
    }

    #[test]
    fn blank_district_entries_match_nothing() {
        let config = FilterConfig {
            districts: vec!["".into(), "   ".into(), "cầu giấy".into()],
            ..FilterConfig::default()
        };
        let filter = ItemFilter::new(&config);
        let item = RawItem {
            location_text: Some("Quận Long Biên".into()),
            ..good_item()
        };

        let v = filter.evaluate(&item, &Deduplicator::new(), today());
        assert_eq!(v.outcome, Err(Rejection::OutsideDistricts));
        assert!(filter.evaluate(&good_item(), &Deduplicator::new(), today()).outcome.is_ok());
    }
}
