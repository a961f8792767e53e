//! MongoDB store client implementation.

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection,
    options::{ClientOptions, FindOptions as MongoFindOptions},
};

use fieldlayer_core::{
    client::{
        DeleteResult, FindOptions, InsertManyResult, InsertOneResult, StoreClient,
        StoreClientBuilder, UpdateResult, UpdateSpec,
    },
    error::{ModelError, ModelResult},
    schema::Namespace,
};

fn store_err(err: impl std::fmt::Display) -> ModelError {
    ModelError::Store(err.to_string())
}

/// Builds the `$set`/`$unset` update document from an [`UpdateSpec`].
fn update_document(update: UpdateSpec) -> Document {
    let mut document = Document::new();

    if !update.set.is_empty() {
        document.insert("$set", update.set);
    }
    if !update.unset.is_empty() {
        let unset = update
            .unset
            .into_iter()
            .map(|key| (key, Bson::String(String::new())))
            .collect::<Document>();
        document.insert("$unset", unset);
    }

    document
}

/// Store client backed by the official MongoDB driver.
///
/// The wrapped [`Client`] holds a connection pool and is cheap to clone; all
/// namespace resolution happens per call, so one `MongoStoreClient` can serve
/// models across databases on the same deployment.
///
/// # Example
///
/// ```ignore
/// use fieldlayer_mongodb::MongoStoreClient;
/// use fieldlayer_core::client::StoreClientBuilder;
///
/// let client = MongoStoreClient::builder("mongodb://localhost:27017")
///     .build()
///     .await?;
/// # Ok::<(), fieldlayer_core::error::ModelError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MongoStoreClient {
    client: Client,
}

impl MongoStoreClient {
    /// Wraps an already-connected driver client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a builder from a MongoDB connection string.
    pub fn builder(dsn: &str) -> MongoStoreBuilder {
        MongoStoreBuilder::new(dsn)
    }

    fn collection(&self, namespace: &Namespace) -> Collection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }
}

#[async_trait]
impl StoreClient for MongoStoreClient {
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> ModelResult<InsertOneResult> {
        let result = self
            .collection(namespace)
            .insert_one(document)
            .await
            .map_err(store_err)?;

        match result.inserted_id {
            Bson::ObjectId(inserted_id) => Ok(InsertOneResult { inserted_id }),
            other => Err(ModelError::Store(format!(
                "driver returned a non object-id insert key: {other}"
            ))),
        }
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult> {
        let count = documents.len();
        let result = self
            .collection(namespace)
            .insert_many(documents)
            .await
            .map_err(store_err)?;

        // The driver hands ids back keyed by input position.
        let mut inserted_ids = Vec::with_capacity(count);
        for index in 0..count {
            match result.inserted_ids.get(&index) {
                Some(Bson::ObjectId(id)) => inserted_ids.push(*id),
                other => {
                    return Err(ModelError::Store(format!(
                        "driver returned a non object-id insert key at {index}: {other:?}"
                    )));
                }
            }
        }

        Ok(InsertManyResult { inserted_ids })
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>> {
        self.collection(namespace)
            .find_one(filter)
            .await
            .map_err(store_err)
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        let mut driver_options = MongoFindOptions::default();
        driver_options.limit = Some(options.limit as i64);
        driver_options.skip = Some(options.skip as u64);

        self.collection(namespace)
            .find(filter)
            .with_options(driver_options)
            .await
            .map_err(store_err)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(store_err)
    }

    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64> {
        self.collection(namespace)
            .count_documents(filter)
            .await
            .map_err(store_err)
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        if update.is_empty() {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        }

        let result = self
            .collection(namespace)
            .update_one(filter, update_document(update))
            .await
            .map_err(store_err)?;

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        if update.is_empty() {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        }

        let result = self
            .collection(namespace)
            .update_many(filter, update_document(update))
            .await
            .map_err(store_err)?;

        Ok(UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        let result = self
            .collection(namespace)
            .delete_one(filter)
            .await
            .map_err(store_err)?;

        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        let result = self
            .collection(namespace)
            .delete_many(filter)
            .await
            .map_err(store_err)?;

        Ok(DeleteResult {
            deleted_count: result.deleted_count,
        })
    }
}

/// Builder for [`MongoStoreClient`], connecting from a DSN string.
pub struct MongoStoreBuilder {
    dsn: String,
}

impl MongoStoreBuilder {
    /// Creates a builder for the given connection string.
    pub fn new(dsn: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
        }
    }
}

#[async_trait]
impl StoreClientBuilder for MongoStoreBuilder {
    type Client = MongoStoreClient;

    async fn build(self) -> ModelResult<Self::Client> {
        let options = ClientOptions::parse(&self.dsn).await.map_err(store_err)?;
        let client = Client::with_options(options).map_err(store_err)?;

        log::debug!("connected mongodb store client");
        Ok(MongoStoreClient::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_document_builds_set_and_unset_stages() {
        let spec = UpdateSpec::new().set("name", "b").unset("tmp");
        let document = update_document(spec);

        assert_eq!(
            document.get_document("$set").unwrap().get("name"),
            Some(&Bson::String("b".into())),
        );
        assert!(document.get_document("$unset").unwrap().contains_key("tmp"));
    }

    #[test]
    fn update_document_omits_empty_stages() {
        let set_only = update_document(UpdateSpec::new().set("a", 1));
        assert!(set_only.contains_key("$set"));
        assert!(!set_only.contains_key("$unset"));

        let unset_only = update_document(UpdateSpec::new().unset("a"));
        assert!(!unset_only.contains_key("$set"));
        assert!(unset_only.contains_key("$unset"));
    }
}
