//! Scrape orchestration.
//!
//! A scrape lists collections, documents and users one after the other. A
//! kind that fails to list is logged, counted and exported as whatever was
//! fetched before the failure; it never stops the other two.

pub mod snapshot;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info};

use crate::client::{OutlineClient, PageSource, Paginator, RetryPolicy};
use crate::metrics::families::{
    SCRAPE_DURATION_SECONDS, SCRAPE_ERRORS_TOTAL, SCRAPE_SUCCESS_TIMESTAMP, UP,
};
use crate::metrics::MetricsRecorder;
use crate::models::{Collection, Document, Entity, User};

pub use snapshot::Snapshot;

/// Result of one scrape, for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeSummary {
    pub success: bool,
    pub failed_kinds: usize,
    pub duration: Duration,
}

/// Runs scrapes against a [`PageSource`].
///
/// The scrape error counter lives here and survives across scrapes;
/// concurrent scrapes share it and nothing else.
pub struct Collector<S = OutlineClient> {
    source: S,
    page_size: usize,
    retry: RetryPolicy,
    scrape_errors: AtomicU64,
}

impl<S: PageSource> Collector<S> {
    pub fn new(source: S, page_size: usize, retry: RetryPolicy) -> Self {
        Self {
            source,
            page_size,
            retry,
            scrape_errors: AtomicU64::new(0),
        }
    }

    /// Failed list fetches since the process started.
    pub fn scrape_errors(&self) -> u64 {
        self.scrape_errors.load(Ordering::Relaxed)
    }

    /// Runs one full scrape and records its samples into `recorder`.
    pub async fn collect<R: MetricsRecorder + ?Sized>(&self, recorder: &mut R) -> ScrapeSummary {
        let started = Instant::now();

        let (collections, collections_ok) = self.fetch_kind::<Collection>().await;
        let (documents, documents_ok) = self.fetch_kind::<Document>().await;
        let (users, users_ok) = self.fetch_kind::<User>().await;

        let failed_kinds = [collections_ok, documents_ok, users_ok]
            .iter()
            .filter(|ok| !**ok)
            .count();
        let success = failed_kinds == 0;

        let now = Utc::now();
        if success {
            recorder.record(&UP, &[], 1.0);
            recorder.record(&SCRAPE_SUCCESS_TIMESTAMP, &[], now.timestamp() as f64);
        } else {
            recorder.record(&UP, &[], 0.0);
        }

        Snapshot::new(collections, documents, users).record(now, recorder);

        let duration = started.elapsed();
        recorder.record(&SCRAPE_DURATION_SECONDS, &[], duration.as_secs_f64());
        recorder.record(&SCRAPE_ERRORS_TOTAL, &[], self.scrape_errors() as f64);

        info!(
            event_name = "collector.scrape.finished",
            event_domain = "collector",
            success,
            failed_kinds,
            duration_ms = duration.as_millis() as u64,
            "scrape finished"
        );

        ScrapeSummary {
            success,
            failed_kinds,
            duration,
        }
    }

    /// Lists every record of `T`. On failure the error is counted and the
    /// records fetched before it are returned.
    async fn fetch_kind<T: Entity>(&self) -> (Vec<T>, bool) {
        let paginator = Paginator::new(&self.source, self.page_size, &self.retry);
        match paginator.fetch_all::<T>().await {
            Ok(items) => (items, true),
            Err(err) => {
                error!(
                    event_name = "collector.fetch.failed",
                    event_domain = "collector",
                    kind = err.kind.as_str(),
                    partial_items = err.partial.len(),
                    "Error fetching {}: {}",
                    err.kind,
                    err
                );
                self.scrape_errors.fetch_add(1, Ordering::Relaxed);
                (err.partial, false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::pagination::tests::{ScriptedSource, collections_page};
    use crate::client::FetchError;
    use crate::metrics::families::{
        COLLECTIONS_TOTAL, COLLECTION_DOCUMENTS_COUNT, DOCUMENTS_TOTAL, DOCUMENT_VIEWS, USERS_TOTAL,
    };
    use crate::metrics::MemoryRecorder;
    use serde_json::json;

    fn documents_page() -> serde_json::Value {
        json!({
            "data": [
                { "id": "d1", "title": "one", "text": "abc", "views": 4, "revision": 2, "collectionId": "c0" },
                { "id": "d2", "title": "two", "text": "", "views": 1, "revision": 1, "collectionId": "c0" }
            ],
            "pagination": { "limit": 25, "offset": 0, "nextPath": "" }
        })
    }

    fn users_page() -> serde_json::Value {
        json!({
            "data": [{ "id": "u1", "name": "Ada" }],
            "pagination": { "limit": 25, "offset": 0, "nextPath": "" }
        })
    }

    fn failure() -> FetchError {
        FetchError::Status {
            status: 500,
            body: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn successful_scrape_reports_up() {
        let source = ScriptedSource::new(vec![
            Ok(collections_page(0, 1, 25, "")),
            Ok(documents_page()),
            Ok(users_page()),
        ]);
        let collector = Collector::new(source, 25, RetryPolicy::default());
        let mut recorder = MemoryRecorder::default();

        let summary = collector.collect(&mut recorder).await;

        assert!(summary.success);
        assert_eq!(recorder.value(&UP), Some(1.0));
        assert!(recorder.has(&SCRAPE_SUCCESS_TIMESTAMP));
        assert_eq!(recorder.value(&SCRAPE_ERRORS_TOTAL), Some(0.0));
        assert_eq!(
            recorder.values(&COLLECTION_DOCUMENTS_COUNT),
            vec![(vec!["c0".to_string(), "Collection 0".to_string()], 2.0)]
        );
        assert_eq!(recorder.value(&USERS_TOTAL), Some(1.0));
        assert!(recorder.has(&SCRAPE_DURATION_SECONDS));
    }

    #[tokio::test]
    async fn failed_collections_do_not_stop_other_kinds() {
        let source = ScriptedSource::new(vec![Err(failure()), Ok(documents_page()), Ok(users_page())]);
        let collector = Collector::new(source, 25, RetryPolicy::default());
        let mut recorder = MemoryRecorder::default();

        let summary = collector.collect(&mut recorder).await;

        assert!(!summary.success);
        assert_eq!(summary.failed_kinds, 1);
        assert_eq!(recorder.value(&UP), Some(0.0));
        assert!(!recorder.has(&SCRAPE_SUCCESS_TIMESTAMP));
        assert_eq!(recorder.value(&SCRAPE_ERRORS_TOTAL), Some(1.0));
        assert!(!recorder.has(&COLLECTIONS_TOTAL));
        assert!(!recorder.has(&COLLECTION_DOCUMENTS_COUNT));
        assert_eq!(recorder.value(&DOCUMENTS_TOTAL), Some(2.0));
        assert_eq!(recorder.values(&DOCUMENT_VIEWS).len(), 2);
        assert_eq!(recorder.value(&USERS_TOTAL), Some(1.0));
    }

    #[tokio::test]
    async fn error_counter_accumulates_across_scrapes() {
        let source = ScriptedSource::new(vec![
            Err(failure()),
            Err(failure()),
            Ok(users_page()),
            Ok(collections_page(0, 1, 25, "")),
            Ok(documents_page()),
            Err(failure()),
        ]);
        let collector = Collector::new(source, 25, RetryPolicy::default());

        let mut first = MemoryRecorder::default();
        collector.collect(&mut first).await;
        let mut second = MemoryRecorder::default();
        collector.collect(&mut second).await;

        assert_eq!(first.value(&SCRAPE_ERRORS_TOTAL), Some(2.0));
        assert_eq!(second.value(&SCRAPE_ERRORS_TOTAL), Some(3.0));
        assert_eq!(collector.scrape_errors(), 3);
    }

    #[tokio::test]
    async fn partial_pages_are_still_exported() {
        let source = ScriptedSource::new(vec![
            Ok(collections_page(0, 2, 2, "/p2")),
            Err(failure()),
            Ok(documents_page()),
            Ok(users_page()),
        ]);
        let collector = Collector::new(source, 2, RetryPolicy::default());
        let mut recorder = MemoryRecorder::default();

        collector.collect(&mut recorder).await;

        assert_eq!(recorder.value(&UP), Some(0.0));
        assert_eq!(recorder.value(&COLLECTIONS_TOTAL), Some(2.0));
    }
}
