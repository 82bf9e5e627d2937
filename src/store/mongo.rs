//! MongoDB Atlas Search backend

use super::{Document, DocumentStore, QueryPage};
use crate::error::StoreError;
use crate::pipeline::{fields, Pipeline};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use mongodb::bson::{self, doc, Bson, Document as BsonDocument};
use mongodb::{Client, Database};
use serde_json::Value;
use tracing::info;

/// Store backed by a MongoDB database with Atlas Search indexes
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to `uri` and use database `db_name`
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::with_source("failed to connect to MongoDB", e))?;
        info!("Connected to MongoDB database {}", db_name);
        Ok(Self {
            db: client.database(db_name),
        })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }
}

fn to_bson_stages(native: Value) -> Result<Vec<BsonDocument>, StoreError> {
    let Value::Array(stages) = native else {
        return Err(StoreError::new("aggregation pipeline must be an array"));
    };
    stages
        .iter()
        .map(|stage| {
            bson::to_document(stage)
                .map_err(|e| StoreError::with_source("failed to encode pipeline stage", e))
        })
        .collect()
}

fn to_json(doc: BsonDocument) -> Document {
    Bson::Document(doc).into_relaxed_extjson()
}

/// Read `total[0].count` from a `$facet` output document
fn facet_total(facet: &BsonDocument) -> u64 {
    let count = facet
        .get_array("total")
        .ok()
        .and_then(|total| total.first())
        .and_then(Bson::as_document)
        .and_then(|entry| entry.get("count"));

    match count {
        Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
        Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
        _ => 0,
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<QueryPage, StoreError> {
        let stages = to_bson_stages(pipeline.to_native_faceted())?;
        let mut cursor = self
            .db
            .collection::<BsonDocument>(collection)
            .aggregate(stages)
            .await?;

        // `$facet` always yields exactly one document
        let Some(facet) = cursor.try_next().await? else {
            return Ok(QueryPage {
                total_count: 0,
                documents: stream::empty().boxed(),
            });
        };

        let total_count = facet_total(&facet);
        let data = match facet.get("data") {
            Some(Bson::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let documents = data.into_iter().map(|item| match item {
            Bson::Document(doc) => Ok(to_json(doc)),
            other => Err(StoreError::new(format!(
                "unexpected aggregation output element: {}",
                other
            ))),
        });

        Ok(QueryPage {
            total_count,
            documents: stream::iter(documents).boxed(),
        })
    }

    async fn find_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        let mut by_key = BsonDocument::new();
        by_key.insert(fields::PROVIDER_KEY, key);
        let mut by_id = BsonDocument::new();
        by_id.insert(fields::DOCUMENT_ID, key);
        let filter = doc! { "$or": [by_key, by_id] };

        let found = self
            .db
            .collection::<BsonDocument>(collection)
            .find_one(filter)
            .await?;
        Ok(found.map(to_json))
    }
}
