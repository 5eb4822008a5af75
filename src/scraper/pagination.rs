//! Advancing the feed to its next page.
//!
//! Strategies run in a fixed order each time a new page is needed, and the
//! first one that lands on a new page wins:
//!
//!   1. numbered page link whose text is the next index
//!   2. the "next" arrow among the paging buttons
//!   3. rewriting `page=<n>` in the current address
//!
//! A navigation error or timeout only fails the strategy that hit it.

use crate::config::{NextControlConfig, SelectorConfig};
use crate::error::SurfaceError;
use crate::scraper::RenderSurface;
use crate::scraper::parsers::{canonical_url, with_page_param};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NumberedLink,
    NextControl,
    UrlIncrement,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [
        Strategy::NumberedLink,
        Strategy::NextControl,
        Strategy::UrlIncrement,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::NumberedLink => "numbered link",
            Strategy::NextControl => "next control",
            Strategy::UrlIncrement => "url increment",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(Strategy),
    Exhausted,
}

// ── Next-control predicate ────────────────────────────────────────────────────

/// What is known about one paging button.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonDescriptor {
    pub icon_classes: Vec<String>,
    pub disabled: bool,
}

/// Decides whether a paging button moves forward.
pub trait NextControlPredicate: Send + Sync {
    fn is_next_control(&self, button: &ButtonDescriptor) -> bool;
}

/// Matches an enabled button whose icon class names a right arrow.
#[derive(Debug, Clone)]
pub struct IconClassRule {
    forward: Vec<String>,
    disabled: Vec<String>,
}

impl IconClassRule {
    pub fn new(config: &NextControlConfig) -> Self {
        Self {
            forward: config.forward_markers.clone(),
            disabled: config.disabled_markers.clone(),
        }
    }
}

impl NextControlPredicate for IconClassRule {
    fn is_next_control(&self, button: &ButtonDescriptor) -> bool {
        let has = |markers: &[String]| {
            button
                .icon_classes
                .iter()
                .any(|c| markers.iter().any(|m| c.contains(m.as_str())))
        };
        !button.disabled && !has(&self.disabled) && has(&self.forward)
    }
}

// ── Paginator ─────────────────────────────────────────────────────────────────

pub struct Paginator {
    selectors: SelectorConfig,
    predicate: Box<dyn NextControlPredicate>,
    navigation_timeout: Duration,
    settle_delay: Duration,
}

impl Paginator {
    pub fn new(
        selectors: SelectorConfig,
        predicate: Box<dyn NextControlPredicate>,
        navigation_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            selectors,
            predicate,
            navigation_timeout,
            settle_delay,
        }
    }

    /// Move from `*page_index` to the next page, bumping the index on success.
    pub async fn advance<S: RenderSurface>(&self, surface: &S, page_index: &mut u32) -> Advance {
        let next = *page_index + 1;

        for strategy in Strategy::ORDER {
            let attempt = match strategy {
                Strategy::NumberedLink => self.numbered_link(surface, next).await,
                Strategy::NextControl => self.next_control(surface).await,
                Strategy::UrlIncrement => self.url_increment(surface, next).await,
            };

            match attempt {
                Ok(true) => {
                    // url increment settles before its emptiness check
                    if strategy != Strategy::UrlIncrement {
                        surface.settle(self.settle_delay).await;
                    }
                    *page_index = next;
                    info!("➡️  Page {} reached via {}", next, strategy);
                    return Advance::Moved(strategy);
                }
                Ok(false) => debug!("{} not applicable for page {}", strategy, next),
                Err(e) => warn!("{} failed for page {}: {}", strategy, next, e),
            }
        }

        info!("No further pages after page {}", *page_index);
        Advance::Exhausted
    }

    async fn numbered_link<S: RenderSurface>(&self, surface: &S, next: u32) -> Result<bool, SurfaceError> {
        let wanted = next.to_string();
        let links = surface.query_all(&self.selectors.page_link).await?;
        debug!("{} numbered page links", links.len());

        let mut failure = None;
        for link in &links {
            let text = match surface.read_text(link).await {
                Ok(t) => t,
                Err(e) => {
                    debug!("Unreadable page link: {}", e);
                    continue;
                }
            };
            if text.trim() != wanted {
                continue;
            }

            let href = surface.read_attribute(link, "href").await.ok().flatten();
            let Err(e) = surface.click_and_wait(link, self.navigation_timeout).await else {
                return Ok(true);
            };
            warn!("Click on page link {} failed: {}", wanted, e);

            let base = surface.current_url().await?;
            let Some(target) = href.and_then(|h| canonical_url(&base, &h)) else {
                failure = Some(e);
                continue;
            };
            match surface.navigate(&target, self.navigation_timeout).await {
                Ok(()) => {
                    info!("Direct navigation to {} succeeded", target);
                    return Ok(true);
                }
                Err(e) => {
                    warn!("Direct navigation to {} failed: {}", target, e);
                    failure = Some(e);
                }
            }
        }
        failure.map_or(Ok(false), Err)
    }

    async fn next_control<S: RenderSurface>(&self, surface: &S) -> Result<bool, SurfaceError> {
        let buttons = surface.query_all(&self.selectors.paging_button).await?;
        debug!("{} paging buttons", buttons.len());

        for (index, button) in buttons.iter().enumerate() {
            let descriptor = match self.describe(surface, button).await {
                Ok(d) => d,
                Err(e) => {
                    debug!("Button {}: {}", index, e);
                    continue;
                }
            };
            debug!(
                "Button {}: classes={:?} disabled={}",
                index, descriptor.icon_classes, descriptor.disabled
            );
            if self.predicate.is_next_control(&descriptor) {
                surface.click_and_wait(button, self.navigation_timeout).await?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn describe<S: RenderSurface>(
        &self,
        surface: &S,
        button: &S::Handle,
    ) -> Result<ButtonDescriptor, SurfaceError> {
        let icon_classes = match surface.query_single(button, &self.selectors.button_icon).await? {
            Some(icon) => surface
                .read_attribute(&icon, "class")
                .await?
                .map(|c| c.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            None => Vec::new(),
        };
        let disabled = surface.read_attribute(button, "disabled").await?.is_some();
        Ok(ButtonDescriptor { icon_classes, disabled })
    }

    async fn url_increment<S: RenderSurface>(&self, surface: &S, next: u32) -> Result<bool, SurfaceError> {
        let current = surface.current_url().await?;
        let Some(target) = with_page_param(&current, next) else {
            return Ok(false);
        };

        debug!("Trying {}", target);
        surface.navigate(&target, self.navigation_timeout).await?;
        surface.settle(self.settle_delay).await;

        let listings = surface.query_all(&self.selectors.listing).await?;
        if listings.is_empty() {
            info!("Page {} has no listings, past the end", next);
            return Ok(false);
        }
        Ok(true)
    }
}
