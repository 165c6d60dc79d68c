//! Outline API client: single-page fetches, retries and pagination.

pub mod error;
pub mod outline;
pub mod pagination;
pub mod retry;

pub use error::FetchError;
pub use outline::{OutlineClient, PageRequest, PageSource};
pub use pagination::{PaginationError, Paginator};
pub use retry::{RetryPolicy, Retryable};
