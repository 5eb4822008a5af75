use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a render surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("navigation to {url} did not settle within {timeout_ms} ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("no element matched `{selector}` within {timeout_ms} ms")]
    SelectorNotFound { selector: String, timeout_ms: u64 },

    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("browser protocol error: {0}")]
    Transport(String),
}

/// Fatal conditions of a crawl run.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("listings never rendered on {url}")]
    InitialRender {
        url: String,
        #[source]
        source: SurfaceError,
    },

    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not read {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("could not write {path:?}: {reason}")]
    Write { path: PathBuf, reason: String },
}
