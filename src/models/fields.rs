use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Decodes an RFC 3339 timestamp, mapping `null` to the Unix epoch.
///
/// Pair with `#[serde(default)]` so an absent field decodes to the same
/// sentinel.
pub(crate) fn nullable_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DateTime<Utc>>::deserialize(deserializer)?.unwrap_or(DateTime::<Utc>::UNIX_EPOCH))
}

/// Decodes a string, mapping `null` to the empty string.
pub(crate) fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a counter, mapping `null` to zero.
pub(crate) fn nullable_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_default())
}
