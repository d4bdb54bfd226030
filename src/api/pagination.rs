//! Query parameters and response body of paginated lists.

use crate::core::pagination::{Page, PageRequest};
use axum::http::Uri;
use serde::{Deserialize, Serialize};

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Page size
    pub limit: Option<u64>,
}

impl PageParams {
    /// Validated request using `default_limit` when `limit` is absent.
    #[must_use]
    pub fn request(self, default_limit: u64) -> PageRequest {
        PageRequest::new(self.page, self.limit, default_limit)
    }
}

/// `{count, next, previous, results}` body of a paginated list
#[derive(Debug, Clone, Serialize)]
pub struct PageResponse<T> {
    /// Total rows across all pages
    pub count: u64,
    /// Link to the next page
    pub next: Option<String>,
    /// Link to the previous page
    pub previous: Option<String>,
    /// Rows on this page
    pub results: Vec<T>,
}

impl<T> PageResponse<T> {
    /// Wraps a page, building navigation links relative to `uri`.
    pub fn new(page: Page<T>, uri: &Uri) -> Self {
        let current = page.request.page;
        let next = page.has_next().then(|| page_link(uri, Some(current.saturating_add(1))));
        let previous = page.has_previous().then(|| {
            // The first page is linked without an explicit page number
            page_link(uri, (current > 2).then(|| current - 1))
        });

        Self {
            count: page.count,
            next,
            previous,
            results: page.results,
        }
    }
}

/// Rebuilds `uri` with its `page` parameter replaced.
fn page_link(uri: &Uri, page: Option<u64>) -> String {
    let mut pairs: Vec<(String, String)> = uri
        .query()
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();
    pairs.retain(|(key, _)| key != "page");
    if let Some(page) = page {
        pairs.push(("page".to_string(), page.to_string()));
    }

    let query = serde_urlencoded::to_string(&pairs).unwrap_or_default();
    if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{query}", uri.path())
    }
}
