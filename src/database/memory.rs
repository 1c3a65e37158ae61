use std::collections::HashMap;

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use regex::RegexBuilder;
use tokio::sync::RwLock;
use tracing::debug;

use super::manager::DatabaseError;
use super::store::{
    Collection, ConditionalInsert, DeleteOutcome, DocumentStore, Filter, InsertOneOutcome, Projection, UpdateOutcome,
};

/// In-process store with the same observable semantics as [`super::MongoStore`].
/// Used by `--in-memory` runs and by the test suite.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection with documents, assigning ids where missing
    pub async fn seed(&self, collection: Collection, documents: impl IntoIterator<Item = Document>) -> Vec<ObjectId> {
        let mut collections = self.collections.write().await;
        let target = collections.entry(collection).or_default();
        documents
            .into_iter()
            .map(|mut document| {
                let id = document.get_object_id("_id").unwrap_or_else(|_| {
                    let id = ObjectId::new();
                    document.insert("_id", id);
                    id
                });
                target.push(document);
                id
            })
            .collect()
    }

    pub async fn count(&self, collection: Collection) -> usize {
        self.collections.read().await.get(&collection).map_or(0, Vec::len)
    }
}

/// Compiled form of a [`Filter`] so regexes are built once per query
enum Matcher<'a> {
    All,
    Id(ObjectId),
    Fields(&'a Document),
    Pattern { field: &'a str, regex: regex::Regex },
}

impl<'a> Matcher<'a> {
    fn compile(filter: &'a Filter) -> Result<Self, DatabaseError> {
        Ok(match filter {
            Filter::All => Matcher::All,
            Filter::Id(id) => Matcher::Id(*id),
            Filter::Fields(fields) => Matcher::Fields(fields),
            Filter::Pattern { field, pattern } => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| DatabaseError::InvalidQuery(e.to_string()))?;
                Matcher::Pattern { field, regex }
            }
        })
    }

    fn matches(&self, document: &Document) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Id(id) => document.get_object_id("_id").map_or(false, |d| d == *id),
            Matcher::Fields(fields) => fields.iter().all(|(k, v)| document.get(k) == Some(v)),
            Matcher::Pattern { field, regex } => match document.get(*field) {
                Some(Bson::String(s)) => regex.is_match(s),
                _ => false,
            },
        }
    }
}

fn project(document: &Document, projection: Projection) -> Document {
    match projection {
        Projection::Full => document.clone(),
        Projection::Exclude(fields) => document
            .iter()
            .filter(|(k, _)| !fields.iter().any(|f| *f == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, filter: Filter, projection: Projection) -> Result<Vec<Document>, DatabaseError> {
        let matcher = Matcher::compile(&filter)?;
        let collections = self.collections.read().await;
        let documents: Vec<Document> = collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|d| matcher.matches(d))
            .map(|d| project(d, projection))
            .collect();
        debug!("find on {} returned {} documents", collection.name(), documents.len());
        Ok(documents)
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Document>, DatabaseError> {
        let matcher = Matcher::compile(&filter)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| matcher.matches(d)))
            .cloned())
    }

    async fn insert_one(&self, collection: Collection, mut document: Document) -> Result<InsertOneOutcome, DatabaseError> {
        let id = ObjectId::new();
        document.insert("_id", id);
        self.collections.write().await.entry(collection).or_default().push(document);
        Ok(InsertOneOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(&self, collection: Collection, id: ObjectId, fields: Document, upsert: bool) -> Result<UpdateOutcome, DatabaseError> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        let matcher = Matcher::Id(id);

        if let Some(existing) = documents.iter_mut().find(|d| matcher.matches(d)) {
            let mut modified = false;
            for (k, v) in fields {
                if existing.get(&k) != Some(&v) {
                    existing.insert(k, v);
                    modified = true;
                }
            }
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 1,
                modified_count: u64::from(modified),
                upserted_id: None,
                upserted_count: 0,
            });
        }

        if !upsert {
            return Ok(UpdateOutcome {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
                upserted_id: None,
                upserted_count: 0,
            });
        }

        let mut document = Document::new();
        document.insert("_id", id);
        for (k, v) in fields {
            document.insert(k, v);
        }
        documents.push(document);
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id),
            upserted_count: 1,
        })
    }

    async fn delete_one(&self, collection: Collection, id: ObjectId) -> Result<DeleteOutcome, DatabaseError> {
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        let matcher = Matcher::Id(id);
        let deleted_count = match documents.iter().position(|d| matcher.matches(d)) {
            Some(index) => {
                documents.remove(index);
                1
            }
            None => 0,
        };
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count,
        })
    }

    async fn insert_if_absent(&self, collection: Collection, key: Document, mut document: Document) -> Result<ConditionalInsert, DatabaseError> {
        // Check and insert under one write lock
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection).or_default();
        let matcher = Matcher::Fields(&key);

        if let Some(existing) = documents.iter().find(|d| matcher.matches(d)) {
            let id = existing
                .get_object_id("_id")
                .map_err(|_| DatabaseError::InvalidQuery("document has no ObjectId _id".to_string()))?;
            return Ok(ConditionalInsert { id, inserted: false });
        }

        let id = ObjectId::new();
        document.insert("_id", id);
        for (k, v) in key.iter() {
            document.insert(k.clone(), v.clone());
        }
        documents.push(document);
        Ok(ConditionalInsert { id, inserted: true })
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn shutdown(&self) {}
}
