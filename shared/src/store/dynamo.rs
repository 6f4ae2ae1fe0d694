use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use serde_json::Value;

use super::{CollectionPath, DocPath, Document, DocumentStore, FieldFilter, StoreError};

/// DynamoDB-backed document store over a single table:
/// PK = parent document key ("PROJECT#{id}", or the bare collection label
/// for roots), SK = "{COLLECTION}#{id}". Each top-level JSON field maps to
/// one attribute; the revision counter lives in a "version" attribute.
pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        DynamoStore {
            client,
            table_name: table_name.into(),
        }
    }

    /// Build a store from the ambient AWS environment.
    /// The table name comes from `TABLE_NAME`.
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        let client = DynamoClient::new(&config);
        let table_name = std::env::var("TABLE_NAME").unwrap_or_else(|_| "stride".to_string());
        DynamoStore::new(client, table_name)
    }
}

/// SK label for a collection name: "issues" -> "ISSUE".
fn sk_label(collection: &str) -> String {
    collection
        .strip_suffix('s')
        .unwrap_or(collection)
        .to_ascii_uppercase()
}

/// PK/SK pair addressing one document.
fn doc_key(path: &DocPath) -> (String, String) {
    let sk = format!("{}#{}", sk_label(path.collection()), path.id());
    let pk = match path.parent_doc() {
        Some(parent) => format!("{}#{}", sk_label(parent.collection()), parent.id()),
        None => sk_label(path.collection()),
    };
    (pk, sk)
}

/// PK and SK prefix covering every document of a collection.
fn collection_key(collection: &CollectionPath) -> (String, String) {
    let prefix = format!("{}#", sk_label(collection.collection()));
    let pk = match collection.parent_doc() {
        Some(parent) => format!("{}#{}", sk_label(parent.collection()), parent.id()),
        None => sk_label(collection.collection()),
    };
    (pk, prefix)
}

fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute_value(v)))
                .collect(),
        ),
    }
}

fn from_attribute_value(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => n
            .parse::<serde_json::Number>()
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::L(items) => Value::Array(items.iter().map(from_attribute_value).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), from_attribute_value(v)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn item_to_document(item: &HashMap<String, AttributeValue>) -> Document {
    let mut fields = serde_json::Map::new();
    let mut version = 0u64;
    for (key, value) in item {
        match key.as_str() {
            "PK" | "SK" => {}
            "version" => {
                version = value
                    .as_n()
                    .ok()
                    .and_then(|n| n.parse().ok())
                    .unwrap_or(0);
            }
            _ => {
                fields.insert(key.clone(), from_attribute_value(value));
            }
        }
    }
    Document {
        fields: Value::Object(fields),
        version,
    }
}

#[async_trait]
impl DocumentStore for DynamoStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let (pk, sk) = doc_key(path);

        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("DynamoDB get_item error: {}", e)))?;

        Ok(result.item().map(item_to_document))
    }

    async fn list(
        &self,
        collection: &CollectionPath,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        let (pk, sk_prefix) = collection_key(collection);

        let mut builder = self
            .client
            .query()
            .table_name(&self.table_name)
            .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
            .expression_attribute_values(":pk", AttributeValue::S(pk))
            .expression_attribute_values(":sk_prefix", AttributeValue::S(sk_prefix));

        if let Some(filter) = filter {
            builder = builder
                .filter_expression("#filter_field = :filter_value")
                .expression_attribute_names("#filter_field", &filter.field)
                .expression_attribute_values(":filter_value", to_attribute_value(&filter.value));
        }

        let result = builder
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("DynamoDB query error: {}", e)))?;

        Ok(result.items().iter().map(item_to_document).collect())
    }

    async fn upsert(&self, path: &DocPath, fields: Value) -> Result<(), StoreError> {
        let (pk, sk) = doc_key(path);
        let Value::Object(fields) = fields else {
            return Err(StoreError::Serde(format!(
                "document fields for {} must be a JSON object",
                path
            )));
        };

        let mut builder = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", AttributeValue::S(pk))
            .item("SK", AttributeValue::S(sk))
            .item("version", AttributeValue::N("1".to_string()));

        for (field, value) in &fields {
            builder = builder.item(field, to_attribute_value(value));
        }

        builder
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("DynamoDB put_item error: {}", e)))?;

        Ok(())
    }

    async fn update(
        &self,
        path: &DocPath,
        fields: Value,
        expected_version: Option<u64>,
    ) -> Result<(), StoreError> {
        let (pk, sk) = doc_key(path);
        let Value::Object(fields) = fields else {
            return Err(StoreError::Serde(format!(
                "document fields for {} must be a JSON object",
                path
            )));
        };

        let mut update_expr = vec!["#ver = if_not_exists(#ver, :zero) + :one".to_string()];
        let mut expr_names = HashMap::new();
        let mut expr_values = HashMap::new();
        expr_names.insert("#ver".to_string(), "version".to_string());
        expr_values.insert(":zero".to_string(), AttributeValue::N("0".to_string()));
        expr_values.insert(":one".to_string(), AttributeValue::N("1".to_string()));

        for (i, (field, value)) in fields.iter().enumerate() {
            update_expr.push(format!("#f{} = :v{}", i, i));
            expr_names.insert(format!("#f{}", i), field.clone());
            expr_values.insert(format!(":v{}", i), to_attribute_value(value));
        }

        let condition = match expected_version {
            Some(expected) => {
                expr_values.insert(
                    ":expected".to_string(),
                    AttributeValue::N(expected.to_string()),
                );
                "attribute_exists(PK) AND #ver = :expected".to_string()
            }
            None => "attribute_exists(PK)".to_string(),
        };

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .condition_expression(condition);

        for (k, v) in expr_names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in expr_values {
            builder = builder.expression_attribute_values(k, v);
        }

        if let Err(e) = builder.send().await {
            let service_err = e.into_service_error();
            if service_err.is_conditional_check_failed_exception() {
                return Err(match expected_version {
                    Some(expected) => StoreError::Conflict(format!(
                        "version mismatch for {} (expected {})",
                        path, expected
                    )),
                    None => StoreError::NotFound(path.to_string()),
                });
            }
            return Err(StoreError::Unavailable(format!(
                "DynamoDB update_item error: {}",
                service_err
            )));
        }

        Ok(())
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let (pk, sk) = doc_key(path);

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk))
            .key("SK", AttributeValue::S(sk))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(format!("DynamoDB delete_item error: {}", e)))?;

        Ok(())
    }
}
