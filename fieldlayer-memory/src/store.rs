//! In-memory store client implementation.
//!
//! Documents live in a `HashMap` keyed by namespace, guarded by an
//! async-aware read-write lock. Lookups scan the namespace linearly; fine
//! for tests and small datasets, not a substitute for a real database.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;

use fieldlayer_core::{
    client::{
        DeleteResult, FindOptions, InsertManyResult, InsertOneResult, StoreClient,
        StoreClientBuilder, UpdateResult, UpdateSpec,
    },
    error::ModelResult,
    schema::{ID_FIELD, Namespace},
};

use crate::matcher::matches_filter;

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory store client.
///
/// `InMemoryClient` is cloneable and shares its state behind an `Arc`, so
/// clones handed to different tasks see the same data. Namespaces are created
/// lazily on first insert.
///
/// # Example
///
/// ```ignore
/// use fieldlayer_memory::InMemoryClient;
/// use fieldlayer_core::{client::StoreClient, schema::Namespace};
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = InMemoryClient::new();
///     let ns = Namespace::new("appdb", "users");
///
///     let result = client.insert_one(&ns, doc! { "name": "Alice" }).await?;
///     let found = client.find_one(&ns, doc! { "_id": result.inserted_id }).await?;
///     assert!(found.is_some());
///
///     Ok(())
/// }
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryClient {
    /// namespace -> documents, in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryClient {
    /// Creates a new empty in-memory client.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryClient`.
    pub fn builder() -> InMemoryClientBuilder {
        InMemoryClientBuilder::default()
    }
}

/// Ensures the document carries an object id, assigning a fresh one if absent.
fn ensure_id(document: &mut Document) -> ObjectId {
    match document.get(ID_FIELD) {
        Some(Bson::ObjectId(id)) => *id,
        _ => {
            let id = ObjectId::new();
            document.insert(ID_FIELD, id);
            id
        }
    }
}

fn apply_update(document: &mut Document, update: &UpdateSpec) {
    for (key, value) in &update.set {
        document.insert(key.clone(), value.clone());
    }
    for key in &update.unset {
        document.remove(key);
    }
}

#[async_trait]
impl StoreClient for InMemoryClient {
    async fn insert_one(
        &self,
        namespace: &Namespace,
        mut document: Document,
    ) -> ModelResult<InsertOneResult> {
        let id = ensure_id(&mut document);

        let mut store = self.store.write().await;
        store
            .entry(namespace.to_string())
            .or_default()
            .push(document);

        log::debug!("inserted {id} into {namespace}");
        Ok(InsertOneResult { inserted_id: id })
    }

    async fn insert_many(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
    ) -> ModelResult<InsertManyResult> {
        let mut inserted_ids = Vec::with_capacity(documents.len());

        let mut store = self.store.write().await;
        let entries = store.entry(namespace.to_string()).or_default();

        for mut document in documents {
            inserted_ids.push(ensure_id(&mut document));
            entries.push(document);
        }

        log::debug!("inserted {} documents into {namespace}", inserted_ids.len());
        Ok(InsertManyResult { inserted_ids })
    }

    async fn find_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(entries) = store.get(&namespace.to_string()) else {
            return Ok(None);
        };

        Ok(entries
            .iter()
            .find(|document| matches_filter(document, &filter))
            .cloned())
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(entries) = store.get(&namespace.to_string()) else {
            return Ok(vec![]);
        };

        Ok(entries
            .iter()
            .filter(|document| matches_filter(document, &filter))
            .skip(options.skip)
            .take(options.limit)
            .cloned()
            .collect())
    }

    async fn count(&self, namespace: &Namespace, filter: Document) -> ModelResult<u64> {
        let store = self.store.read().await;
        let Some(entries) = store.get(&namespace.to_string()) else {
            return Ok(0);
        };

        Ok(entries
            .iter()
            .filter(|document| matches_filter(document, &filter))
            .count() as u64)
    }

    async fn update_one(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(entries) = store.get_mut(&namespace.to_string()) else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let Some(document) = entries
            .iter_mut()
            .find(|document| matches_filter(document, &filter))
        else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let before = document.clone();
        apply_update(document, &update);
        let modified = *document != before;

        log::debug!("updated one document in {namespace} (modified: {modified})");
        Ok(UpdateResult {
            matched_count: 1,
            modified_count: modified as u64,
        })
    }

    async fn update_many(
        &self,
        namespace: &Namespace,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(entries) = store.get_mut(&namespace.to_string()) else {
            return Ok(UpdateResult {
                matched_count: 0,
                modified_count: 0,
            });
        };

        let mut matched = 0;
        let mut modified = 0;
        for document in entries
            .iter_mut()
            .filter(|document| matches_filter(document, &filter))
        {
            matched += 1;
            let before = document.clone();
            apply_update(document, &update);
            if *document != before {
                modified += 1;
            }
        }

        log::debug!("updated {modified}/{matched} documents in {namespace}");
        Ok(UpdateResult {
            matched_count: matched,
            modified_count: modified,
        })
    }

    async fn delete_one(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        let mut store = self.store.write().await;
        let Some(entries) = store.get_mut(&namespace.to_string()) else {
            return Ok(DeleteResult { deleted_count: 0 });
        };

        let Some(position) = entries
            .iter()
            .position(|document| matches_filter(document, &filter))
        else {
            return Ok(DeleteResult { deleted_count: 0 });
        };

        entries.remove(position);
        log::debug!("deleted one document from {namespace}");
        Ok(DeleteResult { deleted_count: 1 })
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: Document,
    ) -> ModelResult<DeleteResult> {
        let mut store = self.store.write().await;
        let Some(entries) = store.get_mut(&namespace.to_string()) else {
            return Ok(DeleteResult { deleted_count: 0 });
        };

        let before = entries.len();
        entries.retain(|document| !matches_filter(document, &filter));
        let deleted = (before - entries.len()) as u64;

        log::debug!("deleted {deleted} documents from {namespace}");
        Ok(DeleteResult {
            deleted_count: deleted,
        })
    }
}

/// Builder for constructing [`InMemoryClient`] instances.
///
/// Currently a no-op builder; kept so memory and database clients share the
/// same construction path.
#[derive(Default)]
pub struct InMemoryClientBuilder;

#[async_trait]
impl StoreClientBuilder for InMemoryClientBuilder {
    type Client = InMemoryClient;

    async fn build(self) -> ModelResult<Self::Client> {
        Ok(InMemoryClient::new())
    }
}
