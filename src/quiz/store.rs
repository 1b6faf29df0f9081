use std::path::PathBuf;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson, Document},
    Client, Collection,
};
use serde_json::Value;

use crate::quiz::error::StoreError;

/// Source of raw, schema-less question records.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Fetch every record in store order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` when the backing store cannot be reached or read.
    async fn fetch_all(&self) -> Result<Vec<Value>, StoreError>;
}

/// Questions kept in a MongoDB collection.
pub struct MongoStore {
    client: Client,
    collection: Collection<Document>,
    collection_name: String,
}

impl MongoStore {
    /// Parses the URI and prepares the collection handle. No round trip happens here.
    pub async fn new(uri: &str, database: &str, collection: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let handle = client.database(database).collection::<Document>(collection);
        Ok(Self {
            client,
            collection: handle,
            collection_name: collection.to_string(),
        })
    }

    /// Round trip to the server; fails on unreachable hosts and bad credentials.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl QuestionStore for MongoStore {
    async fn fetch_all(&self) -> Result<Vec<Value>, StoreError> {
        let cursor = self
            .collection
            .find(None, None)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;
        log::info!(
            "Found {} documents in collection '{}'",
            documents.len(),
            self.collection_name
        );

        // Relaxed extended JSON keeps doubles as floats and ints as ints,
        // which is what the loader's type checks rely on.
        Ok(documents
            .into_iter()
            .map(|document| Bson::Document(document).into_relaxed_extjson())
            .collect())
    }
}

/// Questions kept in a local JSON file holding one array of objects.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl QuestionStore for JsonFileStore {
    async fn fetch_all(&self) -> Result<Vec<Value>, StoreError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let document: Value =
            serde_json::from_str(&contents).map_err(|e| StoreError::Format(e.to_string()))?;
        match document {
            Value::Array(records) => {
                log::info!(
                    "Found {} records in '{}'",
                    records.len(),
                    self.path.display()
                );
                Ok(records)
            }
            other => Err(StoreError::Format(format!(
                "expected an array of questions, found {}",
                json_type_name(&other)
            ))),
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
