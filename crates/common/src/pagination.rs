//! Page requests and paged results.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest accepted page size.
pub const MAX_LIMIT: u64 = 100;

/// Page request, usually deserialized from `?page=&limit=`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u64>,
    /// Page size.
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Create a page request.
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// Page number, at least 1.
    #[must_use]
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_LIMIT`.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    /// Number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

/// Sort direction for listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Total number of matching rows.
    pub total: u64,
    /// Page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Rows on this page.
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Build a page from the rows fetched for `query`.
    #[must_use]
    pub fn new(results: Vec<T>, total: u64, query: &PageQuery) -> Self {
        Self {
            total,
            page: query.page(),
            limit: query.limit(),
            results,
        }
    }

    /// Convert every row, keeping the page metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            total: self.total,
            page: self.page,
            limit: self.limit,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let query = PageQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_second_page_offset() {
        let query = PageQuery::new(2, 5);
        assert_eq!(query.offset(), 5);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(PageQuery::new(1, 0).limit(), 1);
        assert_eq!(PageQuery::new(1, 1000).limit(), MAX_LIMIT);
        assert_eq!(PageQuery::new(0, 10).page(), 1);
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2, 3], 12, &PageQuery::new(3, 3));
        let mapped = page.map(|n| n * 10);

        assert_eq!(mapped.total, 12);
        assert_eq!(mapped.page, 3);
        assert_eq!(mapped.limit, 3);
        assert_eq!(mapped.results, vec![10, 20, 30]);
    }
}
