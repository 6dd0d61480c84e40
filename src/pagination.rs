//! Pagination support for Taiga list endpoints.
//!
//! Taiga paginates lazily: when asked with `x-lazy-pagination` it returns
//! one page and sets `X-Pagination-Next` while more remain. Callers can also
//! ask for a single explicit page with `page` and `page_size`.

use serde::Serialize;

use crate::error::{Result, TaigaError};
use crate::request::Query;

/// Page size used when the caller asks for a page without a valid size.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Response header announcing another page.
pub(crate) const NEXT_PAGE_HEADER: &str = "x-pagination-next";

/// How a list call walks the server's pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pagination {
    /// Follow `X-Pagination-Next` until the last page.
    #[default]
    Auto,
    /// Fetch exactly one page.
    Page {
        /// Page number (1-indexed).
        page: u32,
        /// Number of items per page.
        page_size: u32,
    },
    /// Ask the server for everything in one response.
    Disabled,
}

/// A page of results from a Taiga list endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Page number requested, if one was.
    pub page: Option<u32>,
    /// Page size requested, if one was.
    pub page_size: Option<u32>,
    /// Whether the server announced another page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Create a page from items and the continuation flag.
    #[must_use]
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self {
            items,
            page: None,
            page_size: None,
            has_more,
        }
    }

    /// Record which page was requested.
    #[must_use]
    pub fn at(mut self, page: Option<u32>, page_size: Option<u32>) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            has_more: self.has_more,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Whether a continuation header value announces another page.
///
/// The server sends the next page's URL; any non-empty value counts, and an
/// absent or empty one means the last page was reached.
pub(crate) fn has_next(header: Option<&str>) -> bool {
    header.is_some_and(|value| !value.is_empty())
}

/// Page size from a raw query value. Anything that is not a positive number
/// falls back to [`DEFAULT_PAGE_SIZE`].
pub(crate) fn page_size_or_default(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|size| *size > 0)
        .unwrap_or(DEFAULT_PAGE_SIZE)
}

/// Split the reserved `page`/`page_size` keys out of list filters.
///
/// A `page` key selects explicit paging. Otherwise pages are followed
/// automatically, and a caller-supplied `page_size` stays in the filters.
pub(crate) fn split_filters(mut filters: Query) -> Result<(Query, Pagination)> {
    let Some(raw_page) = filters.remove("page") else {
        if filters.get("page_size").is_some() {
            let size = page_size_or_default(filters.get("page_size"));
            filters.insert("page_size", size);
        }
        return Ok((filters, Pagination::Auto));
    };

    let page = raw_page
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|page| *page > 0)
        .ok_or_else(|| {
            TaigaError::Usage(format!("page must be a positive integer, got '{raw_page}'"))
        })?;
    let page_size = page_size_or_default(filters.remove("page_size").as_deref());

    Ok((filters, Pagination::Page { page, page_size }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_next() {
        assert!(has_next(Some("http://host/api/v1/userstories?page=2")));
        assert!(has_next(Some("true")));
        assert!(!has_next(Some("")));
        assert!(has_next(Some("   ")));
        assert!(!has_next(None));
    }

    #[test]
    fn test_page_size_fallback() {
        assert_eq!(page_size_or_default(Some("50")), 50);
        assert_eq!(page_size_or_default(Some("abc")), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size_or_default(Some("0")), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size_or_default(None), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_split_filters_explicit_page() {
        let filters = Query::new()
            .with("project", 1)
            .with("page", 3)
            .with("page_size", "abc");
        let (rest, pagination) = split_filters(filters).unwrap();
        assert_eq!(
            pagination,
            Pagination::Page {
                page: 3,
                page_size: DEFAULT_PAGE_SIZE
            }
        );
        assert_eq!(rest, Query::new().with("project", 1));
    }

    #[test]
    fn test_split_filters_auto_keeps_page_size() {
        let filters = Query::new().with("project", 1).with("page_size", 25);
        let (rest, pagination) = split_filters(filters.clone()).unwrap();
        assert_eq!(pagination, Pagination::Auto);
        assert_eq!(rest, filters);
    }

    #[test]
    fn test_split_filters_invalid_page() {
        let filters = Query::new().with("page", "last");
        assert!(matches!(split_filters(filters), Err(TaigaError::Usage(_))));
    }

    #[test]
    fn test_page_map() {
        let page = Page::new(vec![1, 2, 3], true).at(Some(1), Some(100));
        let mapped = page.map(|x| x * 2);
        assert_eq!(mapped.items, vec![2, 4, 6]);
        assert_eq!(mapped.page, Some(1));
        assert!(mapped.has_more);
    }
}
