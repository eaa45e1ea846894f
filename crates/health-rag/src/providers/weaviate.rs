//! Weaviate vector store (REST objects + GraphQL `nearVector`)

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;

use crate::config::VectorDbConfig;
use crate::error::{Error, Result};

use super::vector_store::{StoredObject, VectorStoreProvider};

/// Weaviate REST client bound to one class
pub struct WeaviateStore {
    client: Client,
    base_url: String,
    class_name: String,
}

#[derive(Deserialize)]
struct Schema {
    #[serde(default)]
    classes: Vec<SchemaClass>,
}

#[derive(Deserialize)]
struct SchemaClass {
    class: String,
}

#[derive(Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

impl WeaviateStore {
    /// Create a store client
    pub fn new(config: &VectorDbConfig) -> Result<Self> {
        if config.class_name.is_empty()
            || !config.class_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::Config(format!(
                "Invalid Weaviate class name '{}'",
                config.class_name
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.weaviate_url.trim_end_matches('/').to_string(),
            class_name: config.class_name.clone(),
        })
    }

    /// Class definition with `text` and `meta` text properties
    fn class_definition(&self) -> Value {
        json!({
            "class": self.class_name,
            "description": "Sentences and their vectors",
            "vectorizer": "none",
            "properties": [
                {"name": "text", "dataType": ["text"]},
                {"name": "meta", "dataType": ["text"]},
            ],
        })
    }

    /// GraphQL near-vector query for this class
    fn near_vector_query(&self, vector: &[f32], limit: usize) -> Result<String> {
        let vector = serde_json::to_string(vector)?;
        Ok(format!(
            "{{ Get {{ {}(nearVector: {{vector: {}}}, limit: {}) {{ text meta }} }} }}",
            self.class_name, vector, limit
        ))
    }

    async fn get_schema(&self) -> Result<Schema> {
        let url = format!("{}/v1/schema", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Schema request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::vector_db(format!(
                "Schema request failed: HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse schema: {}", e)))
    }

    /// Pull `{text, meta}` rows out of a GraphQL `Get` response
    fn parse_matches(&self, response: GraphQlResponse) -> Result<Vec<StoredObject>> {
        if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::vector_db(messages.join("; ")));
        }

        let rows = response
            .data
            .as_ref()
            .and_then(|d| d.get("Get"))
            .and_then(|g| g.get(&self.class_name))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(rows
            .into_iter()
            .map(|row| StoredObject {
                text: row.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
                meta: row.get("meta").and_then(Value::as_str).unwrap_or_default().to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl VectorStoreProvider for WeaviateStore {
    async fn ensure_schema(&self) -> Result<()> {
        let schema = self.get_schema().await?;
        if schema.classes.iter().any(|c| c.class == self.class_name) {
            return Ok(());
        }

        let url = format!("{}/v1/schema", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&self.class_definition())
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Create class failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Create class failed: HTTP {} - {}",
                status, body
            )));
        }

        tracing::info!("Created Weaviate class '{}'", self.class_name);
        Ok(())
    }

    async fn upsert(&self, id: Uuid, vector: &[f32], payload: &StoredObject) -> Result<()> {
        let url = format!("{}/v1/objects", self.base_url);
        let body = json!({
            "class": self.class_name,
            "id": id,
            "properties": {"text": payload.text, "meta": payload.meta},
            "vector": vector,
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Object create failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::vector_db(format!(
                "Object create failed: HTTP {} - {}",
                status, body
            )));
        }

        Ok(())
    }

    async fn nearest(&self, vector: &[f32], limit: usize) -> Result<Vec<StoredObject>> {
        let url = format!("{}/v1/graphql", self.base_url);
        let query = self.near_vector_query(vector, limit)?;

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(|e| Error::vector_db(format!("Near-vector query failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::vector_db(format!(
                "Near-vector query failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| Error::vector_db(format!("Failed to parse query response: {}", e)))?;

        self.parse_matches(parsed)
    }

    async fn health_check(&self) -> Result<()> {
        self.get_schema().await.map(|_| ())
    }

    fn name(&self) -> &str {
        "weaviate"
    }
}
