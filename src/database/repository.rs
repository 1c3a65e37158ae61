use mongodb::bson::{oid::ObjectId, Document};
use serde_json::{Map, Value};

use crate::api::format::{document_to_json, json_object_to_document};
use crate::database::manager::DatabaseError;
use crate::database::store::{
    Collection, ConditionalInsert, DeleteOutcome, DocumentStore, Filter, InsertOneOutcome, Projection, UpdateOutcome,
};

/// Collection-scoped access that speaks JSON on one side and BSON on the other
pub struct Repository<'a> {
    collection: Collection,
    store: &'a dyn DocumentStore,
}

impl<'a> Repository<'a> {
    pub fn new(collection: Collection, store: &'a dyn DocumentStore) -> Self {
        Self { collection, store }
    }

    pub async fn select_all(&self, projection: Projection) -> Result<Vec<Value>, DatabaseError> {
        self.select_any(Filter::All, projection).await
    }

    pub async fn select_any(&self, filter: Filter, projection: Projection) -> Result<Vec<Value>, DatabaseError> {
        let documents = self.store.find(self.collection, filter, projection).await?;
        Ok(documents.iter().map(document_to_json).collect())
    }

    pub async fn select_one(&self, filter: Filter) -> Result<Option<Value>, DatabaseError> {
        let document = self.store.find_one(self.collection, filter).await?;
        Ok(document.as_ref().map(document_to_json))
    }

    pub async fn create_one(&self, fields: Map<String, Value>) -> Result<InsertOneOutcome, DatabaseError> {
        self.store.insert_one(self.collection, json_object_to_document(fields)).await
    }

    /// Create unless a document matching every `key` field already exists
    pub async fn create_if_absent(&self, key: Document, fields: Map<String, Value>) -> Result<ConditionalInsert, DatabaseError> {
        self.store
            .insert_if_absent(self.collection, key, json_object_to_document(fields))
            .await
    }

    pub async fn upsert_one(&self, id: ObjectId, fields: Map<String, Value>) -> Result<UpdateOutcome, DatabaseError> {
        self.store
            .update_one(self.collection, id, json_object_to_document(fields), true)
            .await
    }

    pub async fn delete_one(&self, id: ObjectId) -> Result<DeleteOutcome, DatabaseError> {
        self.store.delete_one(self.collection, id).await
    }
}
