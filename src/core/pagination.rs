//! Page-number pagination shared by the recipe, user and subscription lists.

use serde::Serialize;

/// Upper bound for client-supplied page sizes.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Upper bound for client-supplied page numbers. Keeps the row offset
/// `page * limit` well inside SQLite's signed 64-bit range.
pub const MAX_PAGE: u64 = 1_000_000_000;

/// A validated page request: 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u64,
    /// Items per page, between 1 and [`MAX_PAGE_SIZE`]
    pub limit: u64,
}

impl PageRequest {
    /// Builds a request from optional query values, falling back to page 1 and
    /// `default_limit`. Out-of-range values are clamped rather than rejected.
    #[must_use]
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Zero-based page index as expected by SeaORM's paginator.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page - 1
    }
}

/// One page of results plus the total number of matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total rows across all pages
    pub count: u64,
    /// The request this page answers
    #[serde(skip)]
    pub request: PageRequest,
    /// Rows on this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wraps fetched rows.
    #[must_use]
    pub const fn new(results: Vec<T>, count: u64, request: PageRequest) -> Self {
        Self {
            count,
            request,
            results,
        }
    }

    /// A page with nothing on it.
    #[must_use]
    pub const fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    /// Whether rows exist past this page.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.request.page.saturating_mul(self.request.limit) < self.count
    }

    /// Whether this is not the first page.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.request.page > 1
    }
}
