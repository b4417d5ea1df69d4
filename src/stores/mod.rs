// Persistence backends - uniform CRUD over entity collections

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{BackendKind, Config};
use crate::models::{StoreError, StoreResult};

pub mod dynamodb;
pub mod local;

pub use dynamodb::RemoteDocumentStore;
pub use local::LocalBlobStore;

/// A stored record: a JSON object carrying its id under the `"id"` key.
pub type Document = serde_json::Map<String, Value>;

/// Entity collections known to the backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    MenuItems,
    Orders,
}

impl Collection {
    /// Key of this collection inside the local blob, and its logical name.
    pub fn key(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::MenuItems => "menuItems",
            Collection::Orders => "orders",
        }
    }

    /// Prefix used for client-generated ids.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Collection::Users => "user",
            Collection::MenuItems => "item",
            Collection::Orders => "order",
        }
    }

    /// Table name suffix for the remote store.
    pub fn table_suffix(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::MenuItems => "menu-items",
            Collection::Orders => "orders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Field-equality predicate for `list`, the only query shape the domain
/// needs (e.g. orders by user, available menu items).
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilter {
    pub field: String,
    pub equals: Value,
}

impl ListFilter {
    pub fn field_equals(field: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
        }
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.get(&self.field) == Some(&self.equals)
    }
}

/// Uniform CRUD surface over entity collections.
///
/// Both implementations expose identical semantics; callers may rely on
/// single-operation atomicity only. There are no cross-operation
/// transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document by id. Absence is `Ok(None)`, not an error.
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;

    /// List documents, optionally narrowed by a field-equality filter.
    async fn list(
        &self,
        collection: Collection,
        filter: Option<ListFilter>,
    ) -> StoreResult<Vec<Document>>;

    /// Write a full document. With an id this upserts that document; without
    /// one the store assigns a fresh id. Returns the document's id.
    async fn put(
        &self,
        collection: Collection,
        id: Option<String>,
        doc: Document,
    ) -> StoreResult<String>;

    /// Shallow-merge `patch` into an existing document. Fails with
    /// [`StoreError::NotFound`] if the document is absent.
    async fn update(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<()>;

    /// Remove a document. Fails with [`StoreError::NotFound`] if absent.
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;

    /// Mint a fresh id for this collection.
    fn generate_id(&self, collection: Collection) -> String;
}

/// Construct the backend selected by configuration.
pub async fn from_config(config: &Config) -> StoreResult<Arc<dyn DocumentStore>> {
    match config.backend {
        BackendKind::Local => Ok(Arc::new(LocalBlobStore::new(&config.local.path))),
        BackendKind::Remote => {
            let aws = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_sdk_dynamodb::config::Region::new(
                    config.remote.region.clone(),
                ))
                .load()
                .await;
            let client = aws_sdk_dynamodb::Client::new(&aws);
            Ok(Arc::new(RemoteDocumentStore::new(
                Arc::new(client),
                config.remote.table_prefix.clone(),
                config.remote.region.clone(),
            )))
        }
    }
}

/// Documents must be JSON objects; anything else is a programming error on
/// the caller's side and surfaces as `InvalidDocument`.
pub(crate) fn object_or_invalid(value: Value) -> StoreResult<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument {
            message: format!("expected JSON object, got {}", type_name(&other)),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
