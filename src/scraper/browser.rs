//! Headless Chromium implementation of [`RenderSurface`].

use crate::config::BrowserConfig;
use crate::error::SurfaceError;
use crate::scraper::RenderSurface;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromiumSurface {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSurface {
    pub async fn launch(config: &BrowserConfig) -> Result<Self, SurfaceError> {
        let mut builder = CdpConfig::builder()
            .request_timeout(config.navigation_timeout())
            .args(config.launch_args.iter().map(String::as_str));

        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.executable {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder.build().map_err(SurfaceError::Launch)?;
        let (browser, mut handler) = Browser::launch(cdp_config)
            .await
            .map_err(|e| SurfaceError::Launch(e.to_string()))?;

        // The CDP connection only makes progress while its event stream is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler stopped: {}", e);
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SurfaceError::Launch(e.to_string()))?;
        page.set_user_agent(config.user_agent.clone())
            .await
            .map_err(transport)?;

        info!("Browser ready (headless={})", config.headless);
        Ok(Self { browser, page, handler })
    }

    /// Close the browser process and stop the handler task.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            debug!("Browser wait failed: {}", e);
        }
        self.handler.abort();
    }
}

fn transport(e: impl std::fmt::Display) -> SurfaceError {
    SurfaceError::Transport(e.to_string())
}

#[async_trait]
impl RenderSurface for ChromiumSurface {
    type Handle = Element;

    async fn navigate(&self, url: &str, limit: Duration) -> Result<(), SurfaceError> {
        debug!("GET {}", url);
        match timeout(limit, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(transport(e)),
            Err(_) => Err(SurfaceError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    async fn wait_for(&self, selector: &str, limit: Duration) -> Result<(), SurfaceError> {
        let deadline = Instant::now() + limit;
        loop {
            let found = self
                .page
                .find_elements(selector)
                .await
                .map(|nodes| !nodes.is_empty())
                .unwrap_or(false);
            if found {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SurfaceError::SelectorNotFound {
                    selector: selector.to_string(),
                    timeout_ms: limit.as_millis() as u64,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Element>, SurfaceError> {
        self.page.find_elements(selector).await.map_err(transport)
    }

    async fn query_single(
        &self,
        scope: &Element,
        selector: &str,
    ) -> Result<Option<Element>, SurfaceError> {
        let mut nodes = scope.find_elements(selector).await.map_err(transport)?;
        if nodes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(nodes.swap_remove(0)))
        }
    }

    async fn read_text(&self, handle: &Element) -> Result<String, SurfaceError> {
        Ok(handle
            .inner_text()
            .await
            .map_err(transport)?
            .unwrap_or_default())
    }

    async fn read_attribute(
        &self,
        handle: &Element,
        name: &str,
    ) -> Result<Option<String>, SurfaceError> {
        handle.attribute(name).await.map_err(transport)
    }

    async fn click_and_wait(&self, handle: &Element, limit: Duration) -> Result<(), SurfaceError> {
        let navigation = async {
            handle.click().await.map_err(transport)?;
            self.page.wait_for_navigation().await.map_err(transport)?;
            Ok::<(), SurfaceError>(())
        };
        match timeout(limit, navigation).await {
            Ok(result) => result,
            Err(_) => Err(SurfaceError::NavigationTimeout {
                url: self.current_url().await.unwrap_or_default(),
                timeout_ms: limit.as_millis() as u64,
            }),
        }
    }

    async fn current_url(&self) -> Result<String, SurfaceError> {
        self.page
            .url()
            .await
            .map_err(transport)?
            .ok_or_else(|| SurfaceError::Transport("page has no URL".to_string()))
    }
}
