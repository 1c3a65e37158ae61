use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument, UpdateOptions};
use mongodb::{Client, Database};
use tracing::{debug, info};

use super::manager::DatabaseError;
use super::store::{
    Collection, ConditionalInsert, DeleteOutcome, DocumentStore, Filter, InsertOneOutcome, Projection, UpdateOutcome,
};

/// MongoDB-backed store. Cheap to clone; the driver pools connections internally.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    pub fn new(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }

    pub fn collection(&self, collection: Collection) -> mongodb::Collection<Document> {
        self.database.collection(collection.name())
    }
}

fn object_id_of(document: &Document) -> Result<ObjectId, DatabaseError> {
    document
        .get_object_id("_id")
        .map_err(|_| DatabaseError::InvalidQuery("document has no ObjectId _id".to_string()))
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find(&self, collection: Collection, filter: Filter, projection: Projection) -> Result<Vec<Document>, DatabaseError> {
        let options = FindOptions::builder().projection(projection.to_document()).build();
        let cursor = self.collection(collection).find(filter.to_document(), options).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        debug!("find on {} returned {} documents", collection.name(), documents.len());
        Ok(documents)
    }

    async fn find_one(&self, collection: Collection, filter: Filter) -> Result<Option<Document>, DatabaseError> {
        Ok(self.collection(collection).find_one(filter.to_document(), None).await?)
    }

    async fn insert_one(&self, collection: Collection, mut document: Document) -> Result<InsertOneOutcome, DatabaseError> {
        let id = ObjectId::new();
        document.insert("_id", id);
        self.collection(collection).insert_one(document, None).await?;
        Ok(InsertOneOutcome {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(&self, collection: Collection, id: ObjectId, fields: Document, upsert: bool) -> Result<UpdateOutcome, DatabaseError> {
        let options = UpdateOptions::builder().upsert(upsert).build();
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields }, options)
            .await?;

        let upserted_id = result.upserted_id.and_then(|b| b.as_object_id());
        Ok(UpdateOutcome {
            acknowledged: true,
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_count: u64::from(upserted_id.is_some()),
            upserted_id,
        })
    }

    async fn delete_one(&self, collection: Collection, id: ObjectId) -> Result<DeleteOutcome, DatabaseError> {
        let result = self.collection(collection).delete_one(doc! { "_id": id }, None).await?;
        Ok(DeleteOutcome {
            acknowledged: true,
            deleted_count: result.deleted_count,
        })
    }

    async fn insert_if_absent(&self, collection: Collection, key: Document, mut document: Document) -> Result<ConditionalInsert, DatabaseError> {
        // Key fields come from the filter on upsert; repeating them in $setOnInsert is a path conflict
        for field in key.keys() {
            document.remove(field);
        }
        let id = ObjectId::new();
        document.insert("_id", id);

        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::Before)
            .build();

        let result = self
            .collection(collection)
            .find_one_and_update(key.clone(), doc! { "$setOnInsert": document }, options)
            .await
            .map_err(DatabaseError::from);

        match result {
            Ok(None) => Ok(ConditionalInsert { id, inserted: true }),
            Ok(Some(existing)) => Ok(ConditionalInsert {
                id: object_id_of(&existing)?,
                inserted: false,
            }),
            // Lost the race on the unique index; the winner is now readable
            Err(e) if e.is_duplicate_key() => {
                let existing = self
                    .collection(collection)
                    .find_one(key, None)
                    .await?
                    .ok_or(e)?;
                Ok(ConditionalInsert {
                    id: object_id_of(&existing)?,
                    inserted: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        info!("Database client shut down");
    }
}
