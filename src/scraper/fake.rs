//! Scripted in-memory surface for tests.

use crate::config::SelectorConfig;
use crate::error::SurfaceError;
use crate::scraper::RenderSurface;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FakeListing {
    pub href: Option<String>,
    pub freshness: Option<String>,
    pub location: Option<String>,
    pub count: Option<String>,
    /// Reading any text of this listing fails.
    pub broken: bool,
}

impl FakeListing {
    pub fn new(href: &str, freshness: &str, location: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            freshness: Some(freshness.to_string()),
            location: Some(location.to_string()),
            count: None,
            broken: false,
        }
    }

    pub fn with_count(mut self, count: &str) -> Self {
        self.count = Some(count.to_string());
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

#[derive(Debug, Clone)]
pub struct FakeButton {
    pub icon_class: String,
    pub disabled: bool,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub url: String,
    pub listings: Vec<FakeListing>,
    /// (visible text, href)
    pub page_links: Vec<(String, String)>,
    pub buttons: Vec<FakeButton>,
    pub link_click_fails: bool,
}

impl FakePage {
    pub fn new(url: &str, listings: Vec<FakeListing>) -> Self {
        Self {
            url: url.to_string(),
            listings,
            ..Default::default()
        }
    }

    pub fn with_page_link(mut self, text: &str, href: &str) -> Self {
        self.page_links.push((text.to_string(), href.to_string()));
        self
    }

    pub fn with_button(mut self, icon_class: &str, disabled: bool, target: Option<&str>) -> Self {
        self.buttons.push(FakeButton {
            icon_class: icon_class.to_string(),
            disabled,
            target: target.map(str::to_string),
        });
        self
    }

    pub fn with_failing_link_clicks(mut self) -> Self {
        self.link_click_fails = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeHandle {
    Listing(usize),
    Link(usize),
    Freshness(usize),
    Location(usize),
    Count(usize),
    PageLink(usize),
    Button(usize),
    Icon(usize),
}

struct Inner {
    pages: Vec<FakePage>,
    current: Option<usize>,
    current_url: String,
    log: Vec<String>,
    failing_navigations: usize,
    unreachable: HashSet<String>,
    detached: HashSet<String>,
}

pub struct FakeSurface {
    inner: Mutex<Inner>,
    selectors: SelectorConfig,
}

impl FakeSurface {
    /// Starts on the first page, as if bring-up already happened.
    pub fn new(pages: Vec<FakePage>) -> Self {
        let current_url = pages.first().map(|p| p.url.clone()).unwrap_or_default();
        let current = if pages.is_empty() { None } else { Some(0) };
        Self {
            inner: Mutex::new(Inner {
                pages,
                current,
                current_url,
                log: Vec::new(),
                failing_navigations: 0,
                unreachable: HashSet::new(),
                detached: HashSet::new(),
            }),
            selectors: SelectorConfig::default(),
        }
    }

    /// The next `n` navigations time out.
    pub fn fail_next_navigations(self, n: usize) -> Self {
        self.inner.lock().unwrap().failing_navigations = n;
        self
    }

    pub fn unreachable(self, url: &str) -> Self {
        self.inner.lock().unwrap().unreachable.insert(url.to_string());
        self
    }

    /// Every query fails while the surface is on `url`.
    pub fn detached(self, url: &str) -> Self {
        self.inner.lock().unwrap().detached.insert(url.to_string());
        self
    }

    pub fn log(&self) -> Vec<String> {
        self.inner.lock().unwrap().log.clone()
    }

    pub fn url(&self) -> String {
        self.inner.lock().unwrap().current_url.clone()
    }

    fn go(inner: &mut Inner, url: &str, limit: Duration) -> Result<(), SurfaceError> {
        inner.log.push(format!("navigate {url}"));
        if inner.failing_navigations > 0 || inner.unreachable.contains(url) {
            inner.failing_navigations = inner.failing_navigations.saturating_sub(1);
            return Err(SurfaceError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: limit.as_millis() as u64,
            });
        }
        inner.current = inner.pages.iter().position(|p| p.url == url);
        inner.current_url = url.to_string();
        Ok(())
    }

    fn matches(&self, inner: &Inner, selector: &str) -> Vec<FakeHandle> {
        let Some(page) = inner.current.map(|i| &inner.pages[i]) else {
            return Vec::new();
        };
        let s = &self.selectors;
        if selector == s.listing {
            (0..page.listings.len()).map(FakeHandle::Listing).collect()
        } else if selector == s.page_link {
            (0..page.page_links.len()).map(FakeHandle::PageLink).collect()
        } else if selector == s.paging_button {
            (0..page.buttons.len()).map(FakeHandle::Button).collect()
        } else {
            Vec::new()
        }
    }

    fn page<'a>(inner: &'a Inner) -> Result<&'a FakePage, SurfaceError> {
        inner
            .current
            .map(|i| &inner.pages[i])
            .ok_or_else(|| SurfaceError::Transport("stale handle".to_string()))
    }
}

#[async_trait]
impl RenderSurface for FakeSurface {
    type Handle = FakeHandle;

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock().unwrap();
        Self::go(&mut inner, url, timeout)
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SurfaceError> {
        let inner = self.inner.lock().unwrap();
        if self.matches(&inner, selector).is_empty() {
            Err(SurfaceError::SelectorNotFound {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })
        } else {
            Ok(())
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FakeHandle>, SurfaceError> {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(format!("query {selector}"));
        if inner.detached.contains(&inner.current_url) {
            return Err(SurfaceError::Transport("target closed".to_string()));
        }
        Ok(self.matches(&inner, selector))
    }

    async fn query_single(
        &self,
        scope: &FakeHandle,
        selector: &str,
    ) -> Result<Option<FakeHandle>, SurfaceError> {
        let inner = self.inner.lock().unwrap();
        let page = Self::page(&inner)?;
        let s = &self.selectors;
        let found = match *scope {
            FakeHandle::Listing(i) => {
                let l = &page.listings[i];
                if selector == s.link {
                    l.href.as_ref().map(|_| FakeHandle::Link(i))
                } else if selector == s.freshness {
                    l.freshness.as_ref().map(|_| FakeHandle::Freshness(i))
                } else if selector == s.location {
                    l.location.as_ref().map(|_| FakeHandle::Location(i))
                } else if selector == s.duplicate_count {
                    l.count.as_ref().map(|_| FakeHandle::Count(i))
                } else {
                    None
                }
            }
            FakeHandle::Button(i) if selector == s.button_icon => {
                (!page.buttons[i].icon_class.is_empty()).then_some(FakeHandle::Icon(i))
            }
            _ => None,
        };
        Ok(found)
    }

    async fn read_text(&self, handle: &FakeHandle) -> Result<String, SurfaceError> {
        let inner = self.inner.lock().unwrap();
        let page = Self::page(&inner)?;
        let text = match *handle {
            FakeHandle::Freshness(i) | FakeHandle::Location(i) | FakeHandle::Count(i)
                if page.listings[i].broken =>
            {
                return Err(SurfaceError::Transport("node detached".to_string()));
            }
            FakeHandle::Freshness(i) => page.listings[i].freshness.clone(),
            FakeHandle::Location(i) => page.listings[i].location.clone(),
            FakeHandle::Count(i) => page.listings[i].count.clone(),
            FakeHandle::PageLink(i) => Some(page.page_links[i].0.clone()),
            _ => None,
        };
        Ok(text.unwrap_or_default())
    }

    async fn read_attribute(
        &self,
        handle: &FakeHandle,
        name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        let inner = self.inner.lock().unwrap();
        let page = Self::page(&inner)?;
        let value = match (*handle, name) {
            (FakeHandle::Link(i), "href") => page.listings[i].href.clone(),
            (FakeHandle::PageLink(i), "href") => Some(page.page_links[i].1.clone()),
            (FakeHandle::Icon(i), "class") => Some(page.buttons[i].icon_class.clone()),
            (FakeHandle::Button(i), "disabled") => {
                page.buttons[i].disabled.then(String::new)
            }
            _ => None,
        };
        Ok(value)
    }

    async fn click_and_wait(&self, handle: &FakeHandle, timeout: Duration) -> Result<(), SurfaceError> {
        let mut inner = self.inner.lock().unwrap();
        let page = Self::page(&inner)?;
        let target = match *handle {
            FakeHandle::PageLink(i) if !page.link_click_fails => Some(page.page_links[i].1.clone()),
            FakeHandle::Button(i) => page.buttons[i].target.clone(),
            _ => None,
        };
        inner.log.push(format!("click {handle:?}"));
        match target {
            Some(url) => Self::go(&mut inner, &url, timeout),
            None => Err(SurfaceError::NavigationTimeout {
                url: inner.current_url.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    async fn current_url(&self) -> Result<String, SurfaceError> {
        Ok(self.url())
    }

    async fn settle(&self, delay: Duration) {
        let mut inner = self.inner.lock().unwrap();
        inner.log.push(format!("settle {}ms", delay.as_millis()));
    }
}
