use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::error::FetchError;
use crate::config::ExporterConfig;
use crate::models::{Entity, Page};

/// Explicit limit/offset sent with the first page of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl PageRequest {
    fn to_body(self) -> Value {
        json!({ "limit": self.limit, "offset": self.offset })
    }
}

/// Something that can return one decoded page of a list endpoint.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches `path` once. `request` is `None` when following a continuation
    /// path, which already encodes limit and offset.
    async fn fetch_page<T: Entity>(
        &self,
        path: &str,
        request: Option<PageRequest>,
    ) -> Result<Page<T>, FetchError>;
}

/// Authenticated client for the Outline REST API.
pub struct OutlineClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    debug: bool,
}

impl OutlineClient {
    /// Builds a client whose every request is bounded by the scrape timeout.
    pub fn new(config: &ExporterConfig) -> Result<Self, reqwest::Error> {
        info!(
            "Creating Outline client for '{}' (timeout {:?})",
            config.outline_api_url, config.scrape_timeout
        );
        let http = reqwest::Client::builder()
            .timeout(config.scrape_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.outline_api_url.trim_end_matches('/').to_string(),
            api_key: config.outline_api_key.clone(),
            debug: config.debug,
        })
    }
}

#[async_trait]
impl PageSource for OutlineClient {
    /// Always POSTs: Outline's list endpoints do not accept GET.
    async fn fetch_page<T: Entity>(
        &self,
        path: &str,
        request: Option<PageRequest>,
    ) -> Result<Page<T>, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let body = request.map_or_else(|| json!({}), PageRequest::to_body);

        debug!("Making POST request to: {}", url);
        if self.debug {
            debug!(url = url.as_str(), body = %body, "request body");
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        let content = response.text().await.map_err(FetchError::Body)?;

        if self.debug {
            debug!(
                url = url.as_str(),
                status = status.as_u16(),
                body = content.as_str(),
                "response body"
            );
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: content,
            });
        }

        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RetryPolicy;
    use crate::models::{Collection, User};
    use mockito::{Matcher, Server};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;

    fn test_client(url: String) -> OutlineClient {
        let config = ExporterConfig {
            outline_api_url: url,
            outline_api_key: "test-key".to_string(),
            ..ExporterConfig::default()
        };
        OutlineClient::new(&config).expect("client should build")
    }

    #[tokio::test]
    async fn test_first_page_sends_limit_and_offset() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/collections.list")
            .match_header("authorization", "Bearer test-key")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_body(Matcher::Json(json!({ "limit": 25, "offset": 0 })))
            .with_status(200)
            .with_body(
                r#"{"data":[{"id":"c1","name":"Eng","createdAt":"2024-01-01T00:00:00Z","updatedAt":null}],
                    "pagination":{"limit":25,"offset":0,"nextPath":""}}"#,
            )
            .create_async()
            .await;

        let page: Page<Collection> = test_client(server.url())
            .fetch_page(
                "/api/collections.list",
                Some(PageRequest {
                    limit: 25,
                    offset: 0,
                }),
            )
            .await
            .expect("page should decode");

        m.assert_async().await;
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "Eng");
    }

    #[tokio::test]
    async fn test_continuation_sends_empty_object() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/api/users.next")
            .match_body(Matcher::Json(json!({})))
            .with_status(200)
            .with_body(r#"{"data":[],"pagination":{"limit":25,"offset":25,"nextPath":""}}"#)
            .create_async()
            .await;

        let page: Page<User> = test_client(format!("{}/", server.url()))
            .fetch_page("/api/users.next", None)
            .await
            .expect("page should decode");

        m.assert_async().await;
        assert!(page.data.is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status_keeps_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/users.list")
            .with_status(401)
            .with_body(r#"{"ok":false,"error":"authentication_required"}"#)
            .create_async()
            .await;

        let result: Result<Page<User>, _> = test_client(server.url())
            .fetch_page("/api/users.list", None)
            .await;

        match result {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("authentication_required"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/users.list")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let result: Result<Page<User>, _> = test_client(server.url())
            .fetch_page("/api/users.list", None)
            .await;

        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_request_timeouts_are_retried_until_exhausted() {
        // accepts connections and never answers them
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });

        let config = ExporterConfig {
            outline_api_url: format!("http://{}", addr),
            outline_api_key: "test-key".to_string(),
            scrape_timeout: Duration::from_millis(100),
            ..ExporterConfig::default()
        };
        let client = OutlineClient::new(&config).expect("client should build");
        let retry = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
        };

        let result: Result<Page<User>, FetchError> = retry
            .run("users.list", || client.fetch_page("/api/users.list", None))
            .await;

        match result {
            Err(FetchError::MaxRetries { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(
                    matches!(*last, FetchError::Transport(ref e) if e.is_timeout()),
                    "{:?}",
                    last
                );
            }
            other => panic!("expected retries to be exhausted, got {:?}", other),
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 4);
    }
}
