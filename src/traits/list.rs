//! List trait for fetching collections of entities.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Resource, SearchableList};
use crate::pagination::{self, Page, Pagination};
use crate::request::Query;

/// List/filter entities with pagination support.
///
/// Implementors only fetch one server response; walking the pages is done
/// here, strictly one page at a time and in order.
///
/// # Example
///
/// ```no_run
/// use taigapi::{List, Pagination, Query, TaigaClient};
///
/// # async fn example(client: TaigaClient) -> taigapi::Result<()> {
/// // Every page, following the server's continuation header
/// let stories = client.user_stories().list(Query::new().with("project", 1)).await?;
///
/// // Only the second page of 50
/// let page = client.user_stories().list_page(Query::new(), 2, 50).await?;
///
/// // One unpaginated response
/// let all = client
///     .user_stories()
///     .list_with(Query::new(), Pagination::Disabled)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait List: Send + Sync {
    /// Issue one list GET.
    ///
    /// `paginate` selects the lazy-pagination header over the
    /// disable-pagination one.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not a list.
    async fn fetch(&self, query: Query, paginate: bool) -> Result<Page<Resource>>;

    /// Stop auto-pagination after this many pages.
    fn max_pages(&self) -> Option<u32> {
        None
    }

    /// List entities matching `filters`.
    ///
    /// The reserved keys `page` and `page_size` select a single explicit
    /// page; without `page` every page is fetched.
    ///
    /// # Errors
    ///
    /// Returns a usage error for a non-numeric `page`, or the first error
    /// of any page request.
    async fn list(&self, filters: Query) -> Result<SearchableList> {
        let (filters, pagination) = pagination::split_filters(filters)?;
        self.list_with(filters, pagination).await
    }

    /// List entities with an explicit pagination mode.
    ///
    /// # Errors
    ///
    /// Returns the first error of any page request.
    async fn list_with(&self, filters: Query, pagination: Pagination) -> Result<SearchableList> {
        match pagination {
            Pagination::Page { page, page_size } => {
                let page = self.list_page(filters, page, page_size).await?;
                Ok(page.items.into())
            }
            Pagination::Disabled => Ok(self.fetch(filters, false).await?.items.into()),
            Pagination::Auto => self.list_all(filters).await,
        }
    }

    /// Fetch a single page.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    async fn list_page(&self, filters: Query, page: u32, page_size: u32) -> Result<Page<Resource>> {
        let query = filters.with("page", page).with("page_size", page_size);
        self.fetch(query, true).await
    }

    /// Fetch every page, following the continuation header.
    ///
    /// An empty page ends the walk even if the header says otherwise.
    ///
    /// # Errors
    ///
    /// Returns the first error of any page request; pages already fetched
    /// are discarded.
    async fn list_all(&self, filters: Query) -> Result<SearchableList> {
        let mut all_items = SearchableList::new();
        let mut query = filters;
        let mut page: u32 = 1;

        loop {
            let result = self.fetch(query.clone(), true).await?;
            let more = result.has_more && !result.is_empty();
            tracing::debug!(page, count = result.len(), more, "fetched page");
            all_items.extend(result.items);

            if !more {
                break;
            }

            if let Some(max) = self.max_pages() {
                if page >= max {
                    tracing::warn!("Reached pagination limit of {} pages, stopping", max);
                    break;
                }
            }

            page += 1;
            query.insert("page", page);
        }

        Ok(all_items)
    }
}
