pub mod browser;
pub mod cleaner;
pub mod pagination;
pub mod parsers;

#[cfg(test)]
pub mod fake;

use crate::error::SurfaceError;
use async_trait::async_trait;
use std::time::Duration;

// ── Surface trait ─────────────────────────────────────────────────────────────

/// A rendered page that can be navigated and queried.
///
/// Every call is a suspension point; the crawl drives one surface
/// sequentially and never shares it between tasks.
#[async_trait]
pub trait RenderSurface: Send + Sync {
    /// Opaque reference to a node of the current document.
    type Handle: Send + Sync;

    /// Load `url` and wait until the document is ready.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), SurfaceError>;

    /// Wait until at least one node matches `selector`.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), SurfaceError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Handle>, SurfaceError>;

    async fn query_single(
        &self,
        scope: &Self::Handle,
        selector: &str,
    ) -> Result<Option<Self::Handle>, SurfaceError>;

    async fn read_text(&self, handle: &Self::Handle) -> Result<String, SurfaceError>;

    async fn read_attribute(
        &self,
        handle: &Self::Handle,
        name: &str,
    ) -> Result<Option<String>, SurfaceError>;

    /// Click `handle` and wait for the navigation it triggers.
    async fn click_and_wait(&self, handle: &Self::Handle, timeout: Duration)
        -> Result<(), SurfaceError>;

    async fn current_url(&self) -> Result<String, SurfaceError>;

    /// Give asynchronously rendered content time to appear.
    async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
