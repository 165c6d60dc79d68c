use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::fields::{nullable_string, nullable_timestamp};

/// A workspace member as returned by `users.list`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "nullable_timestamp")]
    pub last_active_at: DateTime<Utc>,
}
