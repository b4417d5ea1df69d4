use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde_json::{Number, Value};
use tracing::instrument;
use uuid::Uuid;

use crate::models::{StoreError, StoreResult};

use super::{Collection, Document, DocumentStore, ListFilter};

/// Remote multi-document backend: one DynamoDB table per collection, every
/// operation acting on a single document keyed by `id`.
pub struct RemoteDocumentStore {
    client: Arc<DynamoDbClient>,
    table_prefix: String,
    region: String,
}

impl RemoteDocumentStore {
    pub fn new(client: Arc<DynamoDbClient>, table_prefix: String, region: String) -> Self {
        Self {
            client,
            table_prefix,
            region,
        }
    }

    /// Table backing a collection, e.g. `canteen-menu-items`.
    pub fn table_name(&self, collection: Collection) -> String {
        format!("{}-{}", self.table_prefix, collection.table_suffix())
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Convert a JSON document into a DynamoDB item.
pub(crate) fn document_to_item(doc: &Document) -> HashMap<String, AttributeValue> {
    doc.iter()
        .map(|(key, value)| (key.clone(), json_to_attribute(value)))
        .collect()
}

/// Convert a DynamoDB item back into a JSON document.
pub(crate) fn item_to_document(item: HashMap<String, AttributeValue>) -> Document {
    item.into_iter()
        .map(|(key, value)| (key, attribute_to_json(value)))
        .collect()
}

pub(crate) fn json_to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => {
            AttributeValue::L(values.iter().map(json_to_attribute).collect())
        }
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attribute(v)))
                .collect(),
        ),
    }
}

pub(crate) fn attribute_to_json(value: AttributeValue) -> Value {
    match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => n
            .parse::<i64>()
            .ok()
            .map(Value::from)
            .or_else(|| n.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number))
            .unwrap_or(Value::String(n)),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::L(values) => {
            Value::Array(values.into_iter().map(attribute_to_json).collect())
        }
        AttributeValue::M(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, attribute_to_json(v)))
                .collect(),
        ),
        // Binary and set types never occur in our documents.
        other => Value::String(format!("{:?}", other)),
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    #[instrument(skip(self), fields(table = %self.table_name(collection)))]
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let output = self
            .client
            .get_item()
            .table_name(self.table_name(collection))
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable {
                message: e.into_service_error().to_string(),
            })?;

        Ok(output.item.map(item_to_document))
    }

    #[instrument(skip(self, filter), fields(table = %self.table_name(collection)))]
    async fn list(
        &self,
        collection: Collection,
        filter: Option<ListFilter>,
    ) -> StoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(self.table_name(collection))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| StoreError::Unavailable {
                    message: e.into_service_error().to_string(),
                })?;

            documents.extend(
                output
                    .items
                    .unwrap_or_default()
                    .into_iter()
                    .map(item_to_document),
            );

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        if let Some(filter) = filter {
            documents.retain(|doc| filter.matches(doc));
        }
        Ok(documents)
    }

    #[instrument(skip(self, doc), fields(table = %self.table_name(collection)))]
    async fn put(
        &self,
        collection: Collection,
        id: Option<String>,
        mut doc: Document,
    ) -> StoreResult<String> {
        let id = id.unwrap_or_else(|| self.generate_id(collection));
        doc.insert("id".to_string(), Value::String(id.clone()));

        self.client
            .put_item()
            .table_name(self.table_name(collection))
            .set_item(Some(document_to_item(&doc)))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable {
                message: e.into_service_error().to_string(),
            })?;

        Ok(id)
    }

    #[instrument(skip(self, patch), fields(table = %self.table_name(collection)))]
    async fn update(&self, collection: Collection, id: &str, patch: Document) -> StoreResult<()> {
        if patch.is_empty() {
            // Still verify existence so NotFound semantics hold.
            return match self.get(collection, id).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::NotFound),
            };
        }

        let mut request = self
            .client
            .update_item()
            .table_name(self.table_name(collection))
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)");

        let mut clauses = Vec::with_capacity(patch.len());
        for (index, (key, value)) in patch.iter().enumerate() {
            let name = format!("#f{}", index);
            let placeholder = format!(":v{}", index);
            clauses.push(format!("{} = {}", name, placeholder));
            request = request
                .expression_attribute_names(name, key)
                .expression_attribute_values(placeholder, json_to_attribute(value));
        }
        request = request.update_expression(format!("SET {}", clauses.join(", ")));

        request.send().await.map_err(|e| {
            let service_error = e.into_service_error();
            if service_error.is_conditional_check_failed_exception() {
                StoreError::NotFound
            } else {
                StoreError::Unavailable {
                    message: service_error.to_string(),
                }
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self), fields(table = %self.table_name(collection)))]
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(self.table_name(collection))
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("attribute_exists(id)")
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_conditional_check_failed_exception() {
                    StoreError::NotFound
                } else {
                    StoreError::Unavailable {
                        message: service_error.to_string(),
                    }
                }
            })?;

        Ok(())
    }

    fn generate_id(&self, _collection: Collection) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
