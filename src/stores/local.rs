use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::models::{StoreError, StoreResult};

use super::{Collection, Document, DocumentStore, ListFilter};

/// Single-blob key-value backend: one JSON file holds every collection as a
/// top-level array.
///
/// Every operation reads the whole blob, performs a linear scan or mutation
/// on the relevant array and rewrites the whole file. Atomicity therefore
/// exists only at whole-blob-rewrite granularity; there is no cross-process
/// coordination, and concurrent writers are last-writer-wins. Malformed or
/// missing content resets to the empty-default blob.
pub struct LocalBlobStore {
    path: PathBuf,
}

/// On-disk layout of the blob. Absent arrays default to empty.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Blob {
    #[serde(default)]
    users: Vec<Value>,
    #[serde(default, rename = "menuItems")]
    menu_items: Vec<Value>,
    #[serde(default)]
    orders: Vec<Value>,
}

impl Blob {
    fn array(&self, collection: Collection) -> &Vec<Value> {
        match collection {
            Collection::Users => &self.users,
            Collection::MenuItems => &self.menu_items,
            Collection::Orders => &self.orders,
        }
    }

    fn array_mut(&mut self, collection: Collection) -> &mut Vec<Value> {
        match collection {
            Collection::Users => &mut self.users,
            Collection::MenuItems => &mut self.menu_items,
            Collection::Orders => &mut self.orders,
        }
    }
}

fn doc_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

impl LocalBlobStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_blob(&self) -> StoreResult<Blob> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Blob::default()),
            Err(e) => return Err(StoreError::from(e)),
        };
        match serde_json::from_slice(&bytes) {
            Ok(blob) => Ok(blob),
            Err(e) => {
                warn!("malformed blob at {:?}, resetting: {}", self.path, e);
                Ok(Blob::default())
            }
        }
    }

    async fn write_blob(&self, blob: &Blob) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(blob)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for LocalBlobStore {
    #[instrument(skip(self), fields(path = ?self.path))]
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let blob = self.read_blob().await?;
        let found = blob
            .array(collection)
            .iter()
            .find(|value| doc_id(value) == Some(id));
        match found {
            Some(Value::Object(map)) => Ok(Some(map.clone())),
            Some(_) | None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), fields(path = ?self.path))]
    async fn list(
        &self,
        collection: Collection,
        filter: Option<ListFilter>,
    ) -> StoreResult<Vec<Document>> {
        let blob = self.read_blob().await?;
        Ok(blob
            .array(collection)
            .iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map.clone()),
                _ => None,
            })
            .filter(|doc| filter.as_ref().map(|f| f.matches(doc)).unwrap_or(true))
            .collect())
    }

    #[instrument(skip(self, doc), fields(path = ?self.path))]
    async fn put(
        &self,
        collection: Collection,
        id: Option<String>,
        mut doc: Document,
    ) -> StoreResult<String> {
        let mut blob = self.read_blob().await?;
        let id = id.unwrap_or_else(|| self.generate_id(collection));
        doc.insert("id".to_string(), Value::String(id.clone()));

        let array = blob.array_mut(collection);
        match array
            .iter_mut()
            .find(|value| doc_id(value) == Some(id.as_str()))
        {
            Some(slot) => *slot = Value::Object(doc),
            None => array.push(Value::Object(doc)),
        }

        self.write_blob(&blob).await?;
        Ok(id)
    }

    #[instrument(skip(self, patch), fields(path = ?self.path))]
    async fn update(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<()> {
        let mut blob = self.read_blob().await?;
        let array = blob.array_mut(collection);
        let slot = array
            .iter_mut()
            .find(|value| doc_id(value) == Some(id))
            .ok_or(StoreError::NotFound)?;

        if let Value::Object(existing) = slot {
            for (key, value) in patch {
                existing.insert(key, value);
            }
        }

        self.write_blob(&blob).await
    }

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let mut blob = self.read_blob().await?;
        let array = blob.array_mut(collection);
        let before = array.len();
        array.retain(|value| doc_id(value) != Some(id));
        if array.len() == before {
            return Err(StoreError::NotFound);
        }
        self.write_blob(&blob).await
    }

    /// Ids are `{prefix}_{millis}_{random}`; the random suffix keeps them
    /// unique within the blob's lifetime even when two are minted in the
    /// same millisecond.
    fn generate_id(&self, collection: Collection) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}_{}_{}",
            collection.id_prefix(),
            Utc::now().timestamp_millis(),
            &suffix[..9]
        )
    }
}
