//! Store client abstraction: the CRUD primitives a model engine drives.
//!
//! This module defines the traits that abstract over different document
//! stores, letting the model engine persist instances against anything that
//! can insert, find, count, update, and delete BSON documents in a namespace.
//!
//! # Traits
//!
//! - [`StoreClient`]: the core trait for store clients
//! - [`DynStoreClient`]: a trait for dynamic dispatch over client implementations
//! - [`StoreClientBuilder`]: factory trait for creating client instances
//!
//! # Examples
//!
//! ```ignore
//! use fieldlayer_core::client::StoreClient;
//! use fieldlayer_core::schema::Namespace;
//! use bson::doc;
//!
//! let client = MyClientImpl::new();
//! let ns = Namespace::new("appdb", "users");
//!
//! let result = client.insert_one(&ns, doc! { "name": "Alice" }).await?;
//! println!("inserted {}", result.inserted_id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Document, oid::ObjectId};
use serde::{Deserialize, Serialize};
use std::{any::Any, fmt::Debug};

use crate::{error::ModelResult, schema::Namespace};

/// The outcome of a single-document insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertOneResult {
    /// The id assigned to the inserted document.
    pub inserted_id: ObjectId,
}

/// The outcome of a batch insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertManyResult {
    /// The assigned ids, in the order the documents were supplied.
    pub inserted_ids: Vec<ObjectId>,
}

/// The outcome of an update operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResult {
    /// How many documents matched the filter.
    pub matched_count: u64,
    /// How many documents were actually modified.
    pub modified_count: u64,
}

/// The outcome of a delete operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResult {
    /// How many documents were removed.
    pub deleted_count: u64,
}

/// Pagination options for [`StoreClient::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindOptions {
    /// Maximum number of documents to return.
    pub limit: usize,
    /// Number of matching documents to skip before collecting.
    pub skip: usize,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self { limit: 10, skip: 0 }
    }
}

impl FindOptions {
    /// Creates options with the default page shape (limit 10, skip 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the number of matching documents to skip.
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

/// A two-sided modification: fields to set and fields to remove.
///
/// Store clients translate this into their native update form (for MongoDB,
/// a `$set`/`$unset` pair). An empty spec is a no-op.
#[derive(Debug, Clone, Default)]
pub struct UpdateSpec {
    /// Field values to write.
    pub set: Document,
    /// Field names to remove.
    pub unset: Vec<String>,
}

impl UpdateSpec {
    /// Creates an empty update spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field value to write.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<bson::Bson>) -> Self {
        self.set.insert(key.into(), value.into());
        self
    }

    /// Adds a field name to remove.
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.unset.push(key.into());
        self
    }

    /// Returns whether the spec carries no modifications at all.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }
}

/// Abstract interface for document store clients.
///
/// Implementers provide the CRUD primitives against a concrete store, from a
/// process-local map to a remote database. Every operation is addressed to a
/// [`Namespace`] (database plus collection); clients create namespaces lazily
/// on first write.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from
/// multiple async tasks. The exact concurrency model is implementation-specific.
///
/// # Error Handling
///
/// Operations return [`ModelResult<T>`](crate::error::ModelResult); store-side
/// failures surface as [`ModelError::Store`](crate::error::ModelError::Store).
#[async_trait]
pub trait StoreClient: Send + Sync + Debug {
    /// Inserts a single document, assigning an `_id` when the document has none.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The namespace to insert into; created if it doesn't exist.
    /// * `document` - The document to insert.
    ///
    /// # Returns
    ///
    /// The id under which the document was stored.
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> ModelResult<InsertOneResult>;

    /// Inserts a batch of documents in one operation.
    ///
    /// # Arguments
    ///
    /// * `namespace` - The namespace to insert into; created if it doesn't exist.
    /// * `documents` - The documents to insert.
    ///
    /// # Returns
    ///
    /// The assigned ids, positionally aligned with `documents`.
    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult>;

    /// Returns the first document matching `filter`, or `None`.
    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>>;

    /// Returns the documents matching `filter`, paginated by `options`.
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>>;

    /// Counts the documents matching `filter`.
    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64>;

    /// Applies `update` to the first document matching `filter`.
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult>;

    /// Applies `update` to every document matching `filter`.
    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult>;

    /// Removes the first document matching `filter`.
    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult>;

    /// Removes every document matching `filter`.
    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult>;
}

#[async_trait]
impl<C> StoreClient for &C
where
    C: StoreClient,
{
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> ModelResult<InsertOneResult> {
        (*self).insert_one(namespace, document).await
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult> {
        (*self).insert_many(namespace, documents).await
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>> {
        (*self).find_one(namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        (*self).find(namespace, filter, options).await
    }

    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64> {
        (*self).count(namespace, filter).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        (*self).update_one(namespace, filter, update).await
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        (*self).update_many(namespace, filter, update).await
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        (*self).delete_one(namespace, filter).await
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        (*self).delete_many(namespace, filter).await
    }
}

#[async_trait]
impl<C> StoreClient for &mut C
where
    C: StoreClient,
{
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> ModelResult<InsertOneResult> {
        (**self).insert_one(namespace, document).await
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult> {
        (**self).insert_many(namespace, documents).await
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>> {
        (**self).find_one(namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        (**self).find(namespace, filter, options).await
    }

    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64> {
        (**self).count(namespace, filter).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        (**self).update_one(namespace, filter, update).await
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        (**self).update_many(namespace, filter, update).await
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        (**self).delete_one(namespace, filter).await
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        (**self).delete_many(namespace, filter).await
    }
}

/// Object-safe mirror of [`StoreClient`] for dynamic dispatch.
#[async_trait]
pub trait DynStoreClient: Send + Sync + Debug {
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> ModelResult<InsertOneResult>;
    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult>;
    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>>;
    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>>;
    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64>;
    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult>;
    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult>;
    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult>;
    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[async_trait]
impl<C: StoreClient + Send + Sync + 'static> DynStoreClient for C {
    async fn insert_one(
        &self,
        namespace: &Namespace,
        document: Document,
    ) -> ModelResult<InsertOneResult> {
        StoreClient::insert_one(self, namespace, document).await
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult> {
        StoreClient::insert_many(self, namespace, documents).await
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>> {
        StoreClient::find_one(self, namespace, filter).await
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        StoreClient::find(self, namespace, filter, options).await
    }

    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64> {
        StoreClient::count(self, namespace, filter).await
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        StoreClient::update_one(self, namespace, filter, update).await
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        StoreClient::update_many(self, namespace, filter, update).await
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        StoreClient::delete_one(self, namespace, filter).await
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        StoreClient::delete_many(self, namespace, filter).await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Factory trait for constructing store clients.
#[async_trait]
pub trait StoreClientBuilder {
    /// The client type produced by this builder.
    type Client: StoreClient;

    /// Builds and connects the client.
    async fn build(self) -> ModelResult<Self::Client>;
}
