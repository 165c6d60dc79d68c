//! Outline API records decoded from the list endpoints.
//!
//! Every record is fetched fresh on each scrape and dropped once its samples
//! have been recorded.

mod collection;
mod document;
mod fields;
mod page;
mod user;

use std::fmt;

use serde::de::DeserializeOwned;

pub use collection::Collection;
pub use document::Document;
pub use page::{Page, Pagination};
pub use user::User;

/// The three kinds of record the exporter lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Collections,
    Documents,
    Users,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Collections => "collections",
            EntityKind::Documents => "documents",
            EntityKind::Users => "users",
        }
    }

    /// Path of the paged list endpoint for this kind.
    pub fn list_path(&self) -> &'static str {
        match self {
            EntityKind::Collections => "/api/collections.list",
            EntityKind::Documents => "/api/documents.list",
            EntityKind::Users => "/api/users.list",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that can be listed page by page.
pub trait Entity: DeserializeOwned + fmt::Debug + Send + 'static {
    const KIND: EntityKind;
}

impl Entity for Collection {
    const KIND: EntityKind = EntityKind::Collections;
}

impl Entity for Document {
    const KIND: EntityKind = EntityKind::Documents;
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::Users;
}
