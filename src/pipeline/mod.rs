//! Crawl orchestrator: ties surface → filter → storage together.
//!
//! ## Run
//!
//! `run()` opens the start page, then loops page by page:
//!   1. Fetch the listing elements on the current page
//!   2. Extract and filter each one, accumulating accepted listings
//!   3. Stop after too many consecutive pages with nothing recent
//!   4. Advance through the pagination fallbacks, stop when none works
//!
//! Whatever was collected is merged into the output file at the end, and
//! also (best-effort) when the run dies on a fatal error.

pub mod dedup;
pub mod filter;

use crate::config::AppConfig;
use crate::error::CrawlError;
use crate::models::Listing;
use crate::scraper::RenderSurface;
use crate::scraper::pagination::{Advance, IconClassRule, Paginator};
use crate::scraper::parsers::extract_item;
use crate::storage::{MergeOutcome, ResultStore, TabularStore};
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{debug, error, info, warn};

use self::dedup::Deduplicator;
use self::filter::{ItemFilter, Verdict};

// ── Crawl state ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    StaleStreak { pages: u32 },
    NoFurtherPages,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::StaleStreak { pages } => write!(f, "stale streak ({} pages)", pages),
            StopReason::NoFurtherPages => f.write_str("no further pages"),
        }
    }
}

/// Everything one run accumulates. Owned by the loop, never shared.
#[derive(Debug)]
pub struct CrawlState {
    pub current_page_index: u32,
    pub consecutive_stale_pages: u32,
    pub ever_found_recent: bool,
    pub seen: Deduplicator,
    pub accepted: Vec<Listing>,
    pub pages_visited: u32,
    pub items_seen: usize,
}

impl Default for CrawlState {
    fn default() -> Self {
        Self {
            current_page_index: 1,
            consecutive_stale_pages: 0,
            ever_found_recent: false,
            seen: Deduplicator::new(),
            accepted: Vec::new(),
            pages_visited: 0,
            items_seen: 0,
        }
    }
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a filter verdict; true when the listing was accepted.
    pub fn absorb(&mut self, verdict: Verdict) -> bool {
        self.items_seen += 1;
        match verdict.outcome {
            Ok(listing) => {
                self.seen.add(listing.url.as_str());
                self.accepted.push(listing);
                true
            }
            Err(_) => false,
        }
    }

    /// Update the stale streak after a page.
    ///
    /// Pages before the first recent one are never counted.
    pub fn record_page(&mut self, found_recent: bool, stale_limit: u32) -> Option<StopReason> {
        self.pages_visited += 1;
        if found_recent {
            self.consecutive_stale_pages = 0;
            self.ever_found_recent = true;
            return None;
        }
        if !self.ever_found_recent {
            return None;
        }

        self.consecutive_stale_pages += 1;
        warn!(
            "⚠️  No recent listings: {} consecutive pages",
            self.consecutive_stale_pages
        );
        if self.consecutive_stale_pages >= stale_limit {
            Some(StopReason::StaleStreak {
                pages: self.consecutive_stale_pages,
            })
        } else {
            None
        }
    }
}

enum Phase<H> {
    Fetching,
    Extracting(Vec<H>),
    Deciding { found_recent: bool, accepted: usize },
    Advancing,
    Terminated(StopReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages_visited: u32,
    pub items_seen: usize,
    pub accepted: usize,
    pub stop: StopReason,
    pub saved: MergeOutcome,
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

pub struct Pipeline {
    config: AppConfig,
    filter: ItemFilter,
    paginator: Paginator,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        let rule = IconClassRule::new(&config.selectors.next_control);
        let paginator = Paginator::new(
            config.selectors.clone(),
            Box::new(rule),
            config.browser.navigation_timeout(),
            config.crawl.settle_delay(),
        );
        Self {
            filter: ItemFilter::new(&config.filter),
            paginator,
            config,
        }
    }

    /// Crawl the feed and merge the result into the output file.
    pub async fn run<S, T>(
        &self,
        surface: &S,
        store: &ResultStore<T>,
        today: NaiveDate,
    ) -> Result<CrawlReport, CrawlError>
    where
        S: RenderSurface,
        T: TabularStore,
    {
        let path = &self.config.storage.output_path;
        let mut state = CrawlState::new();

        let stop = match self.crawl(surface, &mut state, today).await {
            Ok(stop) => stop,
            Err(e) => {
                error!("💥 Crawl failed: {}", e);
                info!("💾 Saving {} listings collected so far", state.accepted.len());
                if let Err(save_err) = store.save(&state.accepted, path) {
                    error!("Emergency save failed: {}", save_err);
                }
                return Err(e);
            }
        };

        info!(
            "🛑 Stopped: {} | {} pages | {} accepted",
            stop,
            state.pages_visited,
            state.accepted.len()
        );
        let saved = store.save(&state.accepted, path)?;

        Ok(CrawlReport {
            pages_visited: state.pages_visited,
            items_seen: state.items_seen,
            accepted: state.accepted.len(),
            stop,
            saved,
        })
    }

    /// Load the start page, retrying full loads, and wait for listings.
    pub async fn open<S: RenderSurface>(&self, surface: &S) -> Result<(), CrawlError> {
        let url = self.config.crawl.start_url.as_str();
        let browser = &self.config.browser;
        let timeout = browser.navigation_timeout();
        let retries = FixedInterval::new(Duration::from_millis(browser.retry_delay_ms))
            .take(browser.load_retries);

        info!("🌐 Opening {}", url);
        Retry::start(retries, move || async move {
            surface.navigate(url, timeout).await.inspect_err(|e| {
                warn!("Load of {} failed: {}", url, e);
            })
        })
        .await
        .map_err(|source| CrawlError::InitialRender {
            url: url.to_string(),
            source,
        })?;

        surface
            .wait_for(&self.config.selectors.listing, browser.initial_wait())
            .await
            .map_err(|source| CrawlError::InitialRender {
                url: url.to_string(),
                source,
            })
    }

    /// Drive the page loop until it terminates.
    pub async fn crawl<S: RenderSurface>(
        &self,
        surface: &S,
        state: &mut CrawlState,
        today: NaiveDate,
    ) -> Result<StopReason, CrawlError> {
        self.open(surface).await?;
        self.crawl_pages(surface, state, today).await
    }

    async fn crawl_pages<S: RenderSurface>(
        &self,
        surface: &S,
        state: &mut CrawlState,
        today: NaiveDate,
    ) -> Result<StopReason, CrawlError> {
        let selectors = &self.config.selectors;
        let mut phase = Phase::Fetching;

        loop {
            phase = match phase {
                Phase::Fetching => {
                    info!("📄 Page {}", state.current_page_index);
                    let items = surface.query_all(&selectors.listing).await?;
                    info!("🔍 {} listings on page", items.len());
                    Phase::Extracting(items)
                }

                Phase::Extracting(items) => {
                    let base_url = surface.current_url().await?;
                    let mut found_recent = false;
                    let mut accepted = 0;

                    for (index, item) in items.iter().enumerate() {
                        let raw = match extract_item(surface, item, selectors, &base_url).await {
                            Ok(raw) => raw,
                            Err(e) => {
                                warn!("🔥 Item {}: {}", index, e);
                                continue;
                            }
                        };

                        let verdict = self.filter.evaluate(&raw, &state.seen, today);
                        found_recent |= verdict.recent;
                        match &verdict.outcome {
                            Ok(listing) => info!("✅ {} - {}", listing.location, listing.date),
                            Err(why) => debug!("Item {} skipped: {}", index, why),
                        }
                        if state.absorb(verdict) {
                            accepted += 1;
                        }
                    }
                    Phase::Deciding { found_recent, accepted }
                }

                Phase::Deciding { found_recent, accepted } => {
                    info!(
                        "📊 Page {} done: {} accepted | {} total",
                        state.current_page_index,
                        accepted,
                        state.accepted.len()
                    );
                    match state.record_page(found_recent, self.config.crawl.stale_page_limit) {
                        Some(stop) => Phase::Terminated(stop),
                        None => Phase::Advancing,
                    }
                }

                Phase::Advancing => {
                    match self.paginator.advance(surface, &mut state.current_page_index).await {
                        Advance::Moved(_) => Phase::Fetching,
                        Advance::Exhausted => Phase::Terminated(StopReason::NoFurtherPages),
                    }
                }

                Phase::Terminated(stop) => return Ok(stop),
            };
        }
    }
}
