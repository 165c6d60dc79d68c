use std::error::Error as StdError;

use thiserror::Error;

/// Failure of a single page fetch, tagged with the stage that failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("error executing request: {}", chain_text(.0))]
    Transport(#[source] reqwest::Error),

    #[error("API returned status code {status}: {body}")]
    Status { status: u16, body: String },

    #[error("error reading response body: {}", chain_text(.0))]
    Body(#[source] reqwest::Error),

    #[error("error parsing response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("max retries exceeded after {attempts} attempts: {last}")]
    MaxRetries {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// Flattens an error and all of its sources into one line.
///
/// reqwest keeps the interesting part (hyper's "connection closed before
/// message completed", an io timeout, ...) in the source chain.
pub fn chain_text(err: &dyn StdError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Whether a failure message describes a truncated connection or a timeout.
pub fn indicates_transient(text: &str) -> bool {
    const MARKERS: [&str; 6] = [
        "eof",
        "connection reset",
        "connection closed",
        "broken pipe",
        "timed out",
        "timeout",
    ];
    let text = text.to_lowercase();
    MARKERS.iter().any(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_and_timeouts_are_transient() {
        assert!(indicates_transient("unexpected EOF during handshake"));
        assert!(indicates_transient(
            "error sending request: connection closed before message completed"
        ));
        assert!(indicates_transient("Connection reset by peer (os error 104)"));
        assert!(indicates_transient("operation timed out"));
        assert!(indicates_transient("Timeout while reading body"));
    }

    #[test]
    fn other_failures_are_not_transient() {
        assert!(!indicates_transient("API returned status code 500: boom"));
        assert!(!indicates_transient("expected value at line 1 column 1"));
        assert!(!indicates_transient("invalid certificate"));
    }

    #[test]
    fn status_error_carries_body() {
        let err = FetchError::Status {
            status: 401,
            body: r#"{"error":"authentication_required"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"API returned status code 401: {"error":"authentication_required"}"#
        );
    }

    #[test]
    fn max_retries_wraps_last_failure() {
        let err = FetchError::MaxRetries {
            attempts: 4,
            last: Box::new(FetchError::Status {
                status: 504,
                body: "gateway timeout".to_string(),
            }),
        };
        assert!(err.to_string().starts_with("max retries exceeded after 4 attempts"));
        assert!(err.source().is_some());
    }
}
