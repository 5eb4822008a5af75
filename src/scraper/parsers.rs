use crate::config::SelectorConfig;
use crate::error::SurfaceError;
use crate::models::RawItem;
use crate::scraper::RenderSurface;
use url::Url;

// ── Listing element ───────────────────────────────────────────────────────────

/// Read the raw fields of one listing element.
///
/// Missing sub-elements become `None`; only protocol failures are errors,
/// and the caller skips the item on those.
pub async fn extract_item<S: RenderSurface>(
    surface: &S,
    item: &S::Handle,
    selectors: &SelectorConfig,
    base_url: &str,
) -> Result<RawItem, SurfaceError> {
    let url = match surface.query_single(item, &selectors.link).await? {
        Some(link) => surface
            .read_attribute(&link, "href")
            .await?
            .and_then(|href| canonical_url(base_url, &href)),
        None => None,
    };

    Ok(RawItem {
        url,
        freshness_text: child_text(surface, item, &selectors.freshness).await?,
        location_text: child_text(surface, item, &selectors.location).await?,
        duplicate_count_text: child_text(surface, item, &selectors.duplicate_count).await?,
    })
}

async fn child_text<S: RenderSurface>(
    surface: &S,
    scope: &S::Handle,
    selector: &str,
) -> Result<Option<String>, SurfaceError> {
    match surface.query_single(scope, selector).await? {
        Some(node) => Ok(Some(surface.read_text(&node).await?.trim().to_string())),
        None => Ok(None),
    }
}

// ── URLs ──────────────────────────────────────────────────────────────────────

/// Absolute form of `href` with the fragment dropped, so the same listing
/// always produces the same identity key.
pub fn canonical_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let mut url = match Url::parse(href) {
        Ok(u) => u,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    url.set_fragment(None);
    Some(url.to_string())
}

/// `current` with its `page` query parameter set to `page`, other
/// parameters kept in order. Appended when absent.
pub fn with_page_param(current: &str, page: u32) -> Option<String> {
    let mut url = Url::parse(current).ok()?;
    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == "page" {
                replaced = true;
                (k.into_owned(), page.to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &pairs {
            query.append_pair(k, v);
        }
        if !replaced {
            query.append_pair("page", &page.to_string());
        }
    }
    Some(url.to_string())
}
