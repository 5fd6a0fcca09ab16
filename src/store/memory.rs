use super::{
    validate_collection_path, validate_document_path, Document, DocumentStore, Fields, Write,
};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredDocument {
    seq: u64,
    data: Fields,
}

#[derive(Debug, Default, Clone)]
struct State {
    docs: HashMap<String, StoredDocument>,
    next_seq: u64,
}

impl State {
    fn insert(&mut self, path: String, data: Fields) {
        let seq = match self.docs.get(&path) {
            Some(existing) => existing.seq,
            None => {
                self.next_seq += 1;
                self.next_seq
            }
        };
        self.docs.insert(path, StoredDocument { seq, data });
    }

    fn existing_mut(&mut self, path: &str) -> Result<&mut StoredDocument> {
        self.docs
            .get_mut(path)
            .ok_or_else(|| Error::NotFound(format!("No document to update: {}", path)))
    }

    fn apply(&mut self, write: Write) -> Result<()> {
        match write {
            Write::Set { path, data } => {
                validate_document_path(&path)?;
                self.insert(path, data);
            }
            Write::Update { path, fields } => {
                let doc = self.existing_mut(&path)?;
                doc.data.extend(fields);
            }
            Write::Increment { path, field, by } => {
                let doc = self.existing_mut(&path)?;
                let next = match doc.data.get(&field) {
                    Some(Value::Number(n)) if n.is_i64() => {
                        Value::from(n.as_i64().unwrap_or_default().saturating_add(by))
                    }
                    Some(Value::Number(n)) => {
                        Value::from(n.as_f64().unwrap_or_default() + by as f64)
                    }
                    _ => Value::from(by),
                };
                doc.data.insert(field, next);
            }
        }
        Ok(())
    }
}

/// In-process [`DocumentStore`] for local runs and tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document before running a handler.
    pub fn with_document(self, path: &str, data: Value) -> Self {
        if let (Ok(mut state), Value::Object(fields)) = (self.state.lock(), data) {
            state.insert(path.to_string(), fields);
        }
        self
    }

    pub fn document_count(&self) -> usize {
        self.lock().map(|s| s.docs.len()).unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Store("Memory store lock poisoned".to_string()))
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Document>> {
        validate_document_path(path)?;
        let state = self.lock()?;
        Ok(state.docs.get(path).map(|doc| Document {
            id: path.rsplit('/').next().unwrap_or_default().to_string(),
            data: doc.data.clone(),
        }))
    }

    async fn add(&self, collection: &str, data: Fields) -> Result<String> {
        validate_collection_path(collection)?;
        let id = Uuid::new_v4().simple().to_string();
        let mut state = self.lock()?;
        state.insert(format!("{}/{}", collection, id), data);
        Ok(id)
    }

    async fn commit(&self, writes: Vec<Write>) -> Result<()> {
        let mut state = self.lock()?;
        let mut staged = state.clone();
        for write in writes {
            staged.apply(write)?;
        }
        *state = staged;
        Ok(())
    }

    async fn query_last(
        &self,
        collection: &str,
        order_by: &str,
        limit: usize,
    ) -> Result<Vec<Document>> {
        validate_collection_path(collection)?;
        let prefix = format!("{}/", collection);
        let state = self.lock()?;

        let mut matches: Vec<(&String, &StoredDocument)> = state
            .docs
            .iter()
            .filter(|(path, _)| {
                path.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .collect();

        matches.sort_by(|(_, a), (_, b)| {
            compare_field(a.data.get(order_by), b.data.get(order_by)).then(a.seq.cmp(&b.seq))
        });

        let skip = matches.len().saturating_sub(limit);
        Ok(matches
            .into_iter()
            .skip(skip)
            .map(|(path, doc)| Document {
                id: path[prefix.len()..].to_string(),
                data: doc.data.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::to_fields as fields;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_then_get() {
        let store = MemoryStore::new();
        let id = store
            .add("memos", fields(json!({ "content": "hello" })))
            .await
            .unwrap();

        let doc = store.get(&format!("memos/{}", id)).await.unwrap().unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.str_field("content"), Some("hello"));
        assert!(store.get("memos/missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_update_and_increment() {
        let store = MemoryStore::new().with_document("memos/m1", json!({ "replyCount": 2 }));

        store
            .commit(vec![
                Write::Increment {
                    path: "memos/m1".to_string(),
                    field: "replyCount".to_string(),
                    by: 1,
                },
                Write::Update {
                    path: "memos/m1".to_string(),
                    fields: fields(json!({ "updatedById": "u1" })),
                },
                Write::Increment {
                    path: "memos/m1".to_string(),
                    field: "likeCount".to_string(),
                    by: 4,
                },
            ])
            .await
            .unwrap();

        let doc = store.get("memos/m1").await.unwrap().unwrap();
        assert_eq!(
            Value::Object(doc.data),
            json!({ "replyCount": 3, "updatedById": "u1", "likeCount": 4 })
        );
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();

        let err = store
            .commit(vec![
                Write::Set {
                    path: "questions/q1".to_string(),
                    data: fields(json!({ "questionText": "?" })),
                },
                Write::Increment {
                    path: "questionSets/missing".to_string(),
                    field: "questionCount".to_string(),
                    by: 1,
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.get("questions/q1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_last_orders_and_limits() {
        let store = MemoryStore::new();
        for (i, ts) in ["2024-01-03", "2024-01-01", "2024-01-02", "2024-01-04"]
            .iter()
            .enumerate()
        {
            store
                .add(
                    "memos/m1/replies",
                    fields(json!({ "createdAt": ts, "content": i })),
                )
                .await
                .unwrap();
        }
        store
            .add("memos/m2/replies", fields(json!({ "createdAt": "2023-12-31" })))
            .await
            .unwrap();

        let docs = store
            .query_last("memos/m1/replies", "createdAt", 3)
            .await
            .unwrap();

        let order: Vec<&str> = docs.iter().filter_map(|d| d.str_field("createdAt")).collect();
        assert_eq!(order, vec!["2024-01-02", "2024-01-03", "2024-01-04"]);
    }

    #[tokio::test]
    async fn test_query_ties_keep_insertion_order() {
        let store = MemoryStore::new();
        for content in ["a", "b", "c"] {
            store
                .add(
                    "memos/m1/replies",
                    fields(json!({ "createdAt": "same", "content": content })),
                )
                .await
                .unwrap();
        }

        let docs = store
            .query_last("memos/m1/replies", "createdAt", 10)
            .await
            .unwrap();
        let order: Vec<&str> = docs.iter().filter_map(|d| d.str_field("content")).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_invalid_paths_are_rejected() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get("memos").await.unwrap_err(),
            Error::Store(_)
        ));
        assert!(matches!(
            store.add("memos/m1", Fields::new()).await.unwrap_err(),
            Error::Store(_)
        ));
    }
}
