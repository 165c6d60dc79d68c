use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::fields::{nullable_count, nullable_string, nullable_timestamp};

/// A document as returned by `documents.list`.
///
/// `collection_id` is not checked against the collections fetched in the
/// same scrape; drafts come back with no collection at all.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub text: String,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub published_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub archived_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub deleted_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_count")]
    pub views: i64,
    #[serde(default, deserialize_with = "nullable_count")]
    pub revision: i64,
    #[serde(default, deserialize_with = "nullable_string")]
    pub collection_id: String,
}

impl Document {
    /// Size of the document body in bytes.
    pub fn size_bytes(&self) -> usize {
        self.text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_unarchived_document() {
        let document: Document = serde_json::from_value(serde_json::json!({
            "id": "d1",
            "title": "Runbook",
            "text": "héllo",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-03T00:00:00.000Z",
            "publishedAt": "2024-01-02T00:00:00.000Z",
            "archivedAt": null,
            "deletedAt": null,
            "views": 12,
            "revision": 3,
            "collectionId": "c1"
        }))
        .unwrap();

        assert_eq!(document.archived_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(document.deleted_at, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(document.views, 12);
        assert_eq!(document.revision, 3);
        assert_eq!(document.collection_id, "c1");
        // "é" is two bytes in UTF-8
        assert_eq!(document.size_bytes(), 6);
    }

    #[test]
    fn draft_without_collection_decodes() {
        let document: Document =
            serde_json::from_value(serde_json::json!({ "id": "d2", "collectionId": null })).unwrap();

        assert_eq!(document.collection_id, "");
        assert_eq!(document.views, 0);
        assert_eq!(document.size_bytes(), 0);
    }
}
