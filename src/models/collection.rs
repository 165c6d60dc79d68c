use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::fields::{nullable_string, nullable_timestamp};

/// A collection as returned by `collections.list`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub updated_at: DateTime<Utc>,
}
