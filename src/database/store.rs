use async_trait::async_trait;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::Serialize;

use super::manager::DatabaseError;
use crate::api::format::{serialize_object_id, serialize_optional_object_id};

/// Collections exposed by the API, all living in one database namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Categories,
    Recipes,
    Kitchen,
}

impl Collection {
    /// Collection name as stored in the database
    pub fn name(self) -> &'static str {
        match self {
            Collection::Categories => "categories",
            Collection::Recipes => "recipies",
            Collection::Kitchen => "kitchen",
        }
    }
}

/// Query filter understood by every store backend
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document
    All,
    /// Matches the document with this `_id`
    Id(ObjectId),
    /// Exact equality on every field of the document
    Fields(Document),
    /// Case-insensitive regular expression on a string field
    Pattern { field: String, pattern: String },
}

impl Filter {
    pub fn field(name: &str, value: impl Into<Bson>) -> Self {
        let mut fields = Document::new();
        fields.insert(name, value.into());
        Filter::Fields(fields)
    }

    pub fn pattern(field: &str, pattern: &str) -> Self {
        Filter::Pattern {
            field: field.to_string(),
            pattern: pattern.to_string(),
        }
    }

    /// Render as a MongoDB query document
    pub fn to_document(&self) -> Document {
        match self {
            Filter::All => Document::new(),
            Filter::Id(id) => doc! { "_id": *id },
            Filter::Fields(fields) => fields.clone(),
            Filter::Pattern { field, pattern } => {
                let mut query = Document::new();
                query.insert(field.as_str(), doc! { "$regex": pattern.as_str(), "$options": "i" });
                query
            }
        }
    }
}

/// Fields to leave out of returned documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Full,
    Exclude(&'static [&'static str]),
}

impl Projection {
    pub fn to_document(self) -> Option<Document> {
        match self {
            Projection::Full => None,
            Projection::Exclude(fields) => Some(fields.iter().map(|f| (f.to_string(), Bson::Int32(0))).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneOutcome {
    pub acknowledged: bool,
    #[serde(serialize_with = "serialize_object_id")]
    pub inserted_id: ObjectId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(serialize_with = "serialize_optional_object_id")]
    pub upserted_id: Option<ObjectId>,
    pub upserted_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Result of an insert that only happens when no document matches the key
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalInsert {
    pub id: ObjectId,
    pub inserted: bool,
}

/// Document collection store. Implementations must make `insert_if_absent`
/// atomic with respect to concurrent callers using the same key.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(&self, collection: Collection, filter: Filter, projection: Projection) -> Result<Vec<Document>, DatabaseError>;

    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Document>, DatabaseError>;

    async fn insert_one(&self, collection: Collection, document: Document) -> Result<InsertOneOutcome, DatabaseError>;

    /// `$set` the given fields on the document with this id, inserting it when `upsert` is set
    async fn update_one(&self, collection: Collection, id: ObjectId, fields: Document, upsert: bool) -> Result<UpdateOutcome, DatabaseError>;

    async fn delete_one(&self, collection: Collection, id: ObjectId) -> Result<DeleteOutcome, DatabaseError>;

    /// Insert `document` unless a document with all `key` fields exists already
    async fn insert_if_absent(&self, collection: Collection, key: Document, document: Document) -> Result<ConditionalInsert, DatabaseError>;

    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Release the underlying connection; called once after the server drains
    async fn shutdown(&self);
}
