//! Aggregation of one scrape's records into metric samples.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::metrics::families::{
    COLLECTIONS_TOTAL, COLLECTION_AGE_SECONDS, COLLECTION_DOCUMENTS_COUNT, DOCUMENTS_TOTAL,
    DOCUMENT_AGE_SECONDS, DOCUMENT_REVISIONS, DOCUMENT_SIZE_BYTES, DOCUMENT_UPDATE_AGE_SECONDS,
    DOCUMENT_VIEWS, USERS_TOTAL,
};
use crate::metrics::MetricsRecorder;
use crate::models::{Collection, Document, User};

/// Everything fetched during one scrape, with documents de-duplicated.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub collections: Vec<Collection>,
    pub documents: Vec<Document>,
    pub users: Vec<User>,
    /// Documents dropped as duplicates of an earlier one.
    pub duplicate_documents: usize,
}

impl Snapshot {
    pub fn new(collections: Vec<Collection>, documents: Vec<Document>, users: Vec<User>) -> Self {
        let raw_count = documents.len();
        let documents = dedupe_documents(documents);
        let duplicate_documents = raw_count - documents.len();

        if duplicate_documents > 0 {
            warn!(
                event_name = "snapshot.documents.duplicates",
                event_domain = "collector",
                raw_count,
                unique_count = documents.len(),
                duplicate_documents,
                "Found {} duplicate documents",
                duplicate_documents
            );
        }

        Self {
            collections,
            documents,
            users,
            duplicate_documents,
        }
    }

    /// Number of documents per collection id, over unique documents.
    pub fn document_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for document in &self.documents {
            *counts.entry(document.collection_id.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Records the per-kind families. A kind with no records contributes
    /// nothing, not even its total.
    pub fn record<R: MetricsRecorder + ?Sized>(&self, now: DateTime<Utc>, recorder: &mut R) {
        self.record_collections(now, recorder);
        self.record_documents(now, recorder);
        self.record_users(recorder);
    }

    fn record_collections<R: MetricsRecorder + ?Sized>(&self, now: DateTime<Utc>, recorder: &mut R) {
        if self.collections.is_empty() {
            info!("No collections data to export");
            return;
        }

        recorder.record(&COLLECTIONS_TOTAL, &[], self.collections.len() as f64);
        let counts = self.document_counts();
        for collection in &self.collections {
            let labels = [collection.id.as_str(), collection.name.as_str()];
            let count = counts.get(collection.id.as_str()).copied().unwrap_or(0);
            recorder.record(&COLLECTION_DOCUMENTS_COUNT, &labels, count as f64);
            recorder.record(
                &COLLECTION_AGE_SECONDS,
                &labels,
                seconds_since(now, collection.created_at),
            );
        }
    }

    fn record_documents<R: MetricsRecorder + ?Sized>(&self, now: DateTime<Utc>, recorder: &mut R) {
        if self.documents.is_empty() {
            info!("No documents data to export");
            return;
        }

        recorder.record(&DOCUMENTS_TOTAL, &[], self.documents.len() as f64);
        for document in &self.documents {
            let labels = [document.id.as_str(), document.collection_id.as_str()];
            recorder.record(&DOCUMENT_REVISIONS, &labels, document.revision as f64);
            recorder.record(&DOCUMENT_VIEWS, &labels, document.views as f64);
            recorder.record(
                &DOCUMENT_AGE_SECONDS,
                &labels,
                seconds_since(now, document.created_at),
            );
            recorder.record(&DOCUMENT_SIZE_BYTES, &labels, document.size_bytes() as f64);
            recorder.record(
                &DOCUMENT_UPDATE_AGE_SECONDS,
                &labels,
                seconds_since(now, document.updated_at),
            );
        }
    }

    // Per-user series would carry one label value per account, so only the
    // total is exported.
    fn record_users<R: MetricsRecorder + ?Sized>(&self, recorder: &mut R) {
        if self.users.is_empty() {
            info!("No users data to export");
            return;
        }
        recorder.record(&USERS_TOTAL, &[], self.users.len() as f64);
    }
}

/// Drops every document whose (id, collection id) was already seen, keeping
/// the first occurrence and the original order.
pub fn dedupe_documents(documents: Vec<Document>) -> Vec<Document> {
    let mut seen = HashSet::with_capacity(documents.len());
    documents
        .into_iter()
        .filter(|document| seen.insert((document.id.clone(), document.collection_id.clone())))
        .collect()
}

/// Seconds elapsed since `then`; negative when `then` is in the future.
fn seconds_since(now: DateTime<Utc>, then: DateTime<Utc>) -> f64 {
    (now - then).num_milliseconds() as f64 / 1000.0
}
