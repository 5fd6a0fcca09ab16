//! Document store seam used by the handlers
//!
//! Paths alternate collection and document segments
//! (`memos/{memoId}/replies/{replyId}`), as in Firestore.

pub mod memory;

pub use memory::MemoryStore;

use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

pub type Fields = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Fields,
}

impl Document {
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }
}

/// One mutation inside an atomic [`DocumentStore::commit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create or replace the whole document.
    Set { path: String, data: Fields },
    /// Merge fields into an existing document.
    Update { path: String, fields: Fields },
    /// Add `by` to a numeric field of an existing document.
    Increment {
        path: String,
        field: String,
        by: i64,
    },
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &str) -> Result<Option<Document>>;

    /// Creates a document with a generated id and returns the id.
    async fn add(&self, collection: &str, data: Fields) -> Result<String>;

    /// Applies every write or none of them.
    async fn commit(&self, writes: Vec<Write>) -> Result<()>;

    /// The last `limit` documents of `collection` ordered ascending by `order_by`.
    async fn query_last(
        &self,
        collection: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Document>>;
}

/// Fields of a `json!` object literal; anything else yields an empty map.
pub fn to_fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        _ => Fields::new(),
    }
}

/// Server-style timestamp; RFC 3339 with nanoseconds sorts lexically.
pub fn timestamp_now() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub(crate) fn validate_document_path(path: &str) -> Result<()> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() % 2 != 0 || segments.iter().any(|s| s.is_empty()) {
        return Err(Error::Store(format!("Invalid document path: {}", path)));
    }
    Ok(())
}

pub(crate) fn validate_collection_path(path: &str) -> Result<()> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() % 2 != 1 || segments.iter().any(|s| s.is_empty()) {
        return Err(Error::Store(format!("Invalid collection path: {}", path)));
    }
    Ok(())
}
