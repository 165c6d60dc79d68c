use std::collections::HashSet;
use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::error::FetchError;
use super::outline::{PageRequest, PageSource};
use super::retry::RetryPolicy;
use crate::models::{Entity, EntityKind, Page, Pagination};

/// A list that could not be fetched to the end.
///
/// `partial` holds every record fetched before the failing page; it is empty
/// when the first page failed.
#[derive(Error, Debug)]
#[error("error fetching page {page} of {kind}: {source}")]
pub struct PaginationError<T: fmt::Debug> {
    pub kind: EntityKind,
    pub page: usize,
    pub partial: Vec<T>,
    #[source]
    pub source: FetchError,
}

/// Decides whether another page should be requested after one holding
/// `item_count` records.
///
/// Both signals must agree: a non-blank `nextPath` and a full page. The page
/// is measured against the limit the server reports, or `fallback_limit` when
/// it reports none. A full final page with a stale `nextPath` therefore costs
/// one extra request.
pub fn should_paginate(pagination: &Pagination, item_count: usize, fallback_limit: usize) -> bool {
    let limit = if pagination.limit > 0 {
        pagination.limit
    } else {
        fallback_limit
    };
    let has_next_path = !pagination.next_path.trim().is_empty();
    let exact_limit = item_count == limit;

    debug!(
        next_path = pagination.next_path.as_str(),
        has_next_path,
        item_count,
        limit,
        exact_limit,
        "pagination analysis"
    );

    has_next_path && exact_limit
}

/// Walks a paged list endpoint from its first page to its last.
pub struct Paginator<'a, S> {
    source: &'a S,
    page_size: usize,
    retry: &'a RetryPolicy,
}

impl<'a, S: PageSource> Paginator<'a, S> {
    pub fn new(source: &'a S, page_size: usize, retry: &'a RetryPolicy) -> Self {
        Self {
            source,
            page_size,
            retry,
        }
    }

    /// Fetches every record of `T`, following continuation paths.
    ///
    /// Stops when a page says it is the last one, or when the server hands
    /// back a continuation path that was already followed.
    pub async fn fetch_all<T: Entity>(&self) -> Result<Vec<T>, PaginationError<T>> {
        let kind = T::KIND;
        let first_request = PageRequest {
            limit: self.page_size,
            offset: 0,
        };
        debug!("Starting {} fetch with path: {}", kind, kind.list_path());

        let first: Page<T> = self
            .fetch(kind.list_path(), Some(first_request))
            .await
            .map_err(|source| PaginationError {
                kind,
                page: 1,
                partial: Vec::new(),
                source,
            })?;

        info!("Fetched {} {} in first page", first.data.len(), kind);
        let mut next = self.next_path(&first);
        let mut items = first.data;
        let mut pages = 1;
        let mut visited = HashSet::new();

        while let Some(path) = next {
            if !visited.insert(path.clone()) {
                warn!(
                    event_name = "pagination.cycle",
                    event_domain = "client",
                    kind = kind.as_str(),
                    next_path = path.as_str(),
                    pages,
                    "continuation path already visited, stopping pagination"
                );
                break;
            }

            debug!("Following nextPath: {}", path);
            let page: Page<T> = match self.fetch(&path, None).await {
                Ok(page) => page,
                Err(source) => {
                    return Err(PaginationError {
                        kind,
                        page: pages + 1,
                        partial: items,
                        source,
                    })
                }
            };

            pages += 1;
            next = self.next_path(&page);
            let fetched = page.data.len();
            items.extend(page.data);
            info!(
                "Fetched {} {} in page {}, {} total so far",
                fetched,
                kind,
                pages,
                items.len()
            );
        }

        info!(
            "Completed fetching {}: {} items across {} pages",
            kind,
            items.len(),
            pages
        );
        Ok(items)
    }

    async fn fetch<T: Entity>(
        &self,
        path: &str,
        request: Option<PageRequest>,
    ) -> Result<Page<T>, FetchError> {
        self.retry
            .run(path, || self.source.fetch_page::<T>(path, request))
            .await
    }

    fn next_path<T>(&self, page: &Page<T>) -> Option<String> {
        should_paginate(&page.pagination, page.data.len(), self.page_size)
            .then(|| page.pagination.next_path.clone())
    }
}
