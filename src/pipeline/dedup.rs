use std::collections::HashSet;

/// URL identity tracking.
///
/// The session layer grows during a crawl; the persisted layer holds the
/// keys already in the output file and is only filled at merge time.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    session: HashSet<String>,
    persisted: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persisted<I>(urls: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            session: HashSet::new(),
            persisted: urls.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has(&self, url: &str) -> bool {
        self.session.contains(url) || self.persisted.contains(url)
    }

    /// Returns false if the url was already known.
    pub fn add(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.persisted.contains(&url) {
            return false;
        }
        self.session.insert(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn added_urls_are_known() {
        let mut d = Deduplicator::new();
        let urls = ["https://a/1", "https://a/2", "https://a/1", "https://a/3"];
        for u in urls {
            d.add(u);
        }
        for u in urls {
            assert!(d.has(u));
        }
        assert!(!d.has("https://a/4"));
        assert!(!d.add("https://a/3"));
    }

    #[test]
    fn persisted_layer_counts_as_seen() {
        let mut d = Deduplicator::with_persisted(["https://a/old"]);
        assert!(d.has("https://a/old"));
        assert!(!d.add("https://a/old"));
        assert!(d.add("https://a/new"));
        assert!(!d.add("https://a/new"));
    }
}
