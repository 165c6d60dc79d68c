use serde::Deserialize;

use super::fields::nullable_string;

/// Pagination block attached to every list response.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    /// Path of the next page; empty when there is none.
    #[serde(default, deserialize_with = "nullable_string")]
    pub next_path: String,
}

/// One page of a list endpoint.
#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;

    #[test]
    fn decodes_page_with_pagination() {
        let page: Page<User> = serde_json::from_value(serde_json::json!({
            "data": [{ "id": "u1", "name": "Ada", "lastActiveAt": null }],
            "pagination": { "limit": 25, "offset": 0, "nextPath": "/api/users.list?offset=25" }
        }))
        .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.pagination.limit, 25);
        assert_eq!(page.pagination.next_path, "/api/users.list?offset=25");
    }

    #[test]
    fn missing_pagination_means_last_page() {
        let page: Page<User> = serde_json::from_value(serde_json::json!({ "data": [] })).unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.pagination, Pagination::default());
    }

    #[test]
    fn undecodable_record_fails_the_page() {
        let result: Result<Page<User>, _> =
            serde_json::from_value(serde_json::json!({ "data": [{ "name": "no id" }] }));

        assert!(result.is_err());
    }
}
