//! Metric families exported by a scrape.

/// Prometheus metric type of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Name, help text and label names of one metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

impl MetricDesc {
    const fn gauge(name: &'static str, help: &'static str, labels: &'static [&'static str]) -> Self {
        Self {
            name,
            help,
            kind: MetricKind::Gauge,
            labels,
        }
    }
}

const COLLECTION_LABELS: &[&str] = &["collection_id", "collection_name"];
const DOCUMENT_LABELS: &[&str] = &["document_id", "collection_id"];

// Scrape health
pub const UP: MetricDesc = MetricDesc::gauge("outline_up", "Was the last Outline scrape successful", &[]);
pub const SCRAPE_SUCCESS_TIMESTAMP: MetricDesc = MetricDesc::gauge(
    "outline_scrape_success_timestamp",
    "Timestamp of the last successful scrape",
    &[],
);
pub const SCRAPE_ERRORS_TOTAL: MetricDesc = MetricDesc {
    name: "outline_scrape_errors_total",
    help: "Total number of scrape errors",
    kind: MetricKind::Counter,
    labels: &[],
};
pub const SCRAPE_DURATION_SECONDS: MetricDesc = MetricDesc::gauge(
    "outline_scrape_duration_seconds",
    "Duration of the scrape",
    &[],
);

// Collections
pub const COLLECTIONS_TOTAL: MetricDesc = MetricDesc::gauge(
    "outline_collections_total",
    "Total number of collections",
    &[],
);
pub const COLLECTION_DOCUMENTS_COUNT: MetricDesc = MetricDesc::gauge(
    "outline_collection_documents_count",
    "Number of documents in a collection",
    COLLECTION_LABELS,
);
pub const COLLECTION_AGE_SECONDS: MetricDesc = MetricDesc::gauge(
    "outline_collection_age_seconds",
    "Age of collection in seconds",
    COLLECTION_LABELS,
);

// Documents
pub const DOCUMENTS_TOTAL: MetricDesc = MetricDesc::gauge(
    "outline_documents_total",
    "Total number of documents",
    &[],
);
pub const DOCUMENT_REVISIONS: MetricDesc = MetricDesc::gauge(
    "outline_document_revisions",
    "Number of revisions for a document",
    DOCUMENT_LABELS,
);
pub const DOCUMENT_VIEWS: MetricDesc = MetricDesc::gauge(
    "outline_document_views",
    "Number of views for a document",
    DOCUMENT_LABELS,
);
pub const DOCUMENT_AGE_SECONDS: MetricDesc = MetricDesc::gauge(
    "outline_document_age_seconds",
    "Age of document in seconds",
    DOCUMENT_LABELS,
);
pub const DOCUMENT_SIZE_BYTES: MetricDesc = MetricDesc::gauge(
    "outline_document_size_bytes",
    "Size of document text in bytes",
    DOCUMENT_LABELS,
);
pub const DOCUMENT_UPDATE_AGE_SECONDS: MetricDesc = MetricDesc::gauge(
    "outline_document_update_age_seconds",
    "Time since last document update in seconds",
    DOCUMENT_LABELS,
);

// Users
pub const USERS_TOTAL: MetricDesc = MetricDesc::gauge("outline_users_total", "Total number of users", &[]);
