//! MongoDB client and collection wrapper
//!
//! Typed collections apply their schema indexes on open and filter out
//! soft-deleted documents on every read.

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::LeadwayError;

/// MongoDB server code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, LeadwayError> {
        info!("Connecting to MongoDB database '{}'", db_name);

        // Fail fast when the server is unreachable instead of hanging on selection
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| LeadwayError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        let mongo = Self {
            client,
            db_name: db_name.to_string(),
        };
        mongo.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(mongo)
    }

    /// Round-trip a ping command
    pub async fn ping(&self) -> Result<(), LeadwayError> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| LeadwayError::Database(format!("MongoDB ping failed: {}", e)))?;
        Ok(())
    }

    /// Get a typed collection
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, LeadwayError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Open a collection and apply its indexes
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, LeadwayError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), LeadwayError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| LeadwayError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, LeadwayError> {
        let now = DateTime::now();
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(now);
        metadata.updated_at = Some(now);

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| LeadwayError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| LeadwayError::Database("Failed to get inserted ID".into()))
    }

    /// Find one live document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, LeadwayError> {
        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        self.inner
            .find_one(full_filter)
            .await
            .map_err(|e| LeadwayError::Database(format!("Find failed: {}", e)))
    }

    /// Find live documents by filter in the given sort order.
    ///
    /// Documents that fail to decode are logged and skipped.
    pub async fn find_sorted(&self, filter: Document, sort: Document) -> Result<Vec<T>, LeadwayError> {
        use futures_util::StreamExt;

        let mut full_filter = filter;
        full_filter.insert("metadata.is_deleted", doc! { "$ne": true });

        let cursor = self
            .inner
            .find(full_filter)
            .sort(sort)
            .await
            .map_err(|e| LeadwayError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    /// Atomically update (or insert, when `upsert`) one document and return
    /// it as it stands after the write.
    ///
    /// A unique index violation surfaces as [`UpsertError::DuplicateKey`] so
    /// the caller can re-read the winner of a race.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
        upsert: bool,
    ) -> Result<Option<T>, UpsertError> {
        self.inner
            .find_one_and_update(filter, update)
            .upsert(upsert)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| {
                if is_duplicate_key(&e) {
                    UpsertError::DuplicateKey
                } else {
                    UpsertError::Other(LeadwayError::Database(format!("Update failed: {}", e)))
                }
            })
    }
}

/// Failure of an upsert
#[derive(Debug)]
pub enum UpsertError {
    /// Another writer inserted the same unique key first
    DuplicateKey,
    Other(LeadwayError),
}

impl From<UpsertError> for LeadwayError {
    fn from(err: UpsertError) -> Self {
        match err {
            UpsertError::DuplicateKey => LeadwayError::Database("Duplicate key".into()),
            UpsertError::Other(e) => e,
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Command(cmd) => cmd.code == DUPLICATE_KEY_CODE,
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::error::{CommandError, Error, WriteError};

    fn write_error(code: i32) -> Error {
        let we: WriteError =
            bson::from_document(doc! { "code": code, "errmsg": "E11000 duplicate key error" }).unwrap();
        Error::from(ErrorKind::Write(WriteFailure::WriteError(we)))
    }

    fn command_error(code: i32) -> Error {
        let cmd: CommandError =
            bson::from_document(doc! { "code": code, "codeName": "DuplicateKey", "errmsg": "dup" }).unwrap();
        Error::from(ErrorKind::Command(cmd))
    }

    #[test]
    fn test_is_duplicate_key() {
        assert!(is_duplicate_key(&write_error(DUPLICATE_KEY_CODE)));
        assert!(is_duplicate_key(&command_error(DUPLICATE_KEY_CODE)));

        // Document validation failure
        assert!(!is_duplicate_key(&write_error(121)));
        assert!(!is_duplicate_key(&command_error(121)));
    }

    #[test]
    fn test_duplicate_key_maps_to_database_error() {
        let err: LeadwayError = UpsertError::DuplicateKey.into();
        assert!(matches!(err, LeadwayError::Database(_)));
    }
}
