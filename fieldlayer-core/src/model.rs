//! The model engine: typed collection handles and persistent instances.
//!
//! A [`Model`] binds a [`Schema`] to a [`Namespace`] and offers collection-level
//! operations (find, count, batch insert). A [`ModelInstance`] is one document's
//! worth of state, holding raw values until a write-path operation validates
//! them against the schema.
//!
//! Every persistence operation takes the store client explicitly; the engine
//! holds no connection state of its own, so the same model can be driven
//! against different clients (an in-memory store in tests, MongoDB in
//! production).
//!
//! # Examples
//!
//! ```ignore
//! use fieldlayer_core::{field::Field, model::Model, schema::{Namespace, Schema}};
//! use bson::doc;
//!
//! let users = Model::new(
//!     Namespace::new("appdb", "users"),
//!     Schema::builder()
//!         .field("name", Field::string().required())
//!         .field("age", Field::number().min(0))
//!         .build()?,
//! );
//!
//! let mut alice = users.create(doc! { "name": "Alice", "age": 30 });
//! alice.save(&client).await?;
//! # Ok::<(), fieldlayer_core::error::ModelError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bson::{Bson, Document, doc, oid::ObjectId};

use crate::client::{
    DeleteResult, FindOptions, InsertManyResult, StoreClient, UpdateResult, UpdateSpec,
};
use crate::error::{ModelError, ModelResult};
use crate::schema::{ID_FIELD, Namespace, Schema};

/// A collection-level handle: a schema bound to the namespace its documents live in.
///
/// Models are cheap to clone; the schema is shared behind an `Arc` with every
/// instance they spawn.
#[derive(Debug, Clone)]
pub struct Model {
    namespace: Namespace,
    schema: Arc<Schema>,
}

impl Model {
    /// Creates a model over the given namespace and schema.
    pub fn new(namespace: Namespace, schema: Schema) -> Self {
        Self {
            namespace,
            schema: Arc::new(schema),
        }
    }

    /// Returns the namespace this model reads and writes.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the schema governing this model's documents.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Creates an empty, uninitialized instance.
    ///
    /// The instance rejects persistence operations until
    /// [`ModelInstance::init`] runs; use [`Model::create`] to build an
    /// initialized one directly.
    pub fn instance(&self) -> ModelInstance {
        ModelInstance {
            namespace: self.namespace.clone(),
            schema: Arc::clone(&self.schema),
            values: HashMap::new(),
            initialized: false,
        }
    }

    /// Creates an instance initialized from the given values.
    ///
    /// Unknown keys are dropped, absent declared fields pick up their
    /// defaults; no validation happens here.
    pub fn create(&self, values: Document) -> ModelInstance {
        let mut instance = self.instance();
        instance.init(values);
        instance
    }

    /// Rehydrates an instance from a document read back from the store.
    pub fn from_document(&self, document: Document) -> ModelInstance {
        self.create(document)
    }

    /// Looks up a single instance by its `_id`.
    pub async fn find_by_id<C>(&self, client: &C, id: ObjectId) -> ModelResult<Option<ModelInstance>>
    where
        C: StoreClient,
    {
        self.find_one(client, doc! { ID_FIELD: id }).await
    }

    /// Returns the first instance matching `filter`, or `None`.
    pub async fn find_one<C>(
        &self,
        client: &C,
        filter: Document,
    ) -> ModelResult<Option<ModelInstance>>
    where
        C: StoreClient,
    {
        let found = client.find_one(&self.namespace, filter).await?;
        Ok(found.map(|document| self.from_document(document)))
    }

    /// Returns the instances matching `filter`, paginated by `options`.
    pub async fn find<C>(
        &self,
        client: &C,
        filter: Document,
        options: FindOptions,
    ) -> ModelResult<Vec<ModelInstance>>
    where
        C: StoreClient,
    {
        let documents = client.find(&self.namespace, filter, options).await?;
        Ok(documents
            .into_iter()
            .map(|document| self.from_document(document))
            .collect())
    }

    /// Counts the documents matching `filter`.
    pub async fn count<C>(&self, client: &C, filter: Document) -> ModelResult<u64>
    where
        C: StoreClient,
    {
        client.count(&self.namespace, filter).await
    }

    /// Persists a batch of fresh instances in one store call.
    ///
    /// All-or-nothing: every instance is checked for a pre-existing `_id` and
    /// validated before anything is sent, so a bad instance anywhere in the
    /// batch means no store call at all. On success each instance receives
    /// its assigned id, positionally.
    ///
    /// # Errors
    ///
    /// - [`ModelError::AlreadyPersisted`] when an instance carries an `_id`.
    /// - [`ModelError::Validation`] when any instance fails validation.
    pub async fn insert_many<C>(
        &self,
        client: &C,
        instances: &mut [ModelInstance],
    ) -> ModelResult<InsertManyResult>
    where
        C: StoreClient,
    {
        for instance in instances.iter() {
            if let Some(id) = instance.id() {
                return Err(ModelError::AlreadyPersisted(id.to_hex()));
            }
        }

        let mut documents = Vec::with_capacity(instances.len());
        for instance in instances.iter() {
            documents.push(instance.validated_document()?);
        }

        let result = client.insert_many(&self.namespace, documents).await?;

        for (instance, id) in instances.iter_mut().zip(result.inserted_ids.iter()) {
            instance
                .values
                .insert(ID_FIELD.to_string(), Bson::ObjectId(*id));
        }

        Ok(result)
    }

    /// Applies a raw update to the first document matching `filter`.
    pub async fn update_one<C>(
        &self,
        client: &C,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult>
    where
        C: StoreClient,
    {
        client.update_one(&self.namespace, filter, update).await
    }

    /// Applies a raw update to every document matching `filter`.
    pub async fn update_many<C>(
        &self,
        client: &C,
        filter: Document,
        update: UpdateSpec,
    ) -> ModelResult<UpdateResult>
    where
        C: StoreClient,
    {
        client.update_many(&self.namespace, filter, update).await
    }

    /// Removes the first document matching `filter`.
    pub async fn delete_one<C>(&self, client: &C, filter: Document) -> ModelResult<DeleteResult>
    where
        C: StoreClient,
    {
        client.delete_one(&self.namespace, filter).await
    }

    /// Removes every document matching `filter`.
    pub async fn delete_many<C>(&self, client: &C, filter: Document) -> ModelResult<DeleteResult>
    where
        C: StoreClient,
    {
        client.delete_many(&self.namespace, filter).await
    }
}

/// One document's worth of model state.
///
/// Values are held raw until a write-path operation ([`ModelInstance::save`],
/// [`ModelInstance::update`], [`Model::insert_many`]) validates them; the
/// read path ([`ModelInstance::to_obj`]) coerces instead, never failing.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    namespace: Namespace,
    schema: Arc<Schema>,
    values: HashMap<String, Bson>,
    initialized: bool,
}

impl ModelInstance {
    /// (Re)initializes the instance from the given values.
    ///
    /// Existing state is discarded. For each declared field the incoming
    /// value is taken as-is, falling back to the field's default; keys the
    /// schema never declared are dropped.
    pub fn init(&mut self, mut values: Document) {
        self.values.clear();

        for binding in self.schema.bindings() {
            let value = values
                .remove(binding.name())
                .or_else(|| binding.field().default().cloned());

            if let Some(value) = value {
                self.values.insert(binding.name().to_string(), value);
            }
        }

        self.initialized = true;
    }

    /// Returns the instance's object id, when it has been persisted.
    pub fn id(&self) -> Option<ObjectId> {
        match self.values.get(ID_FIELD) {
            Some(Bson::ObjectId(id)) => Some(*id),
            _ => None,
        }
    }

    /// Returns the raw value of a field, if set.
    pub fn get(&self, name: &str) -> Option<&Bson> {
        self.values.get(name)
    }

    /// Returns whether a field currently holds a value.
    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Sets a field to a raw value; validation happens at the next write.
    ///
    /// # Errors
    ///
    /// Fails with [`ModelError::UnknownField`] when the schema never
    /// declared `name`.
    pub fn set(&mut self, name: &str, value: impl Into<Bson>) -> ModelResult<()> {
        if !self.schema.contains(name) {
            return Err(ModelError::UnknownField(name.to_string()));
        }

        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    fn check_init(&self) -> ModelResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(ModelError::NotInitialized)
        }
    }

    /// Returns the validated `_id`, failing when the instance was never persisted.
    fn require_persisted_id(&self) -> ModelResult<Bson> {
        let raw = self
            .values
            .get(ID_FIELD)
            .ok_or(ModelError::NotPersisted)?;

        let id_field = self
            .schema
            .get(ID_FIELD)
            .ok_or_else(|| ModelError::Schema(format!("schema has no {ID_FIELD} binding")))?;

        match id_field.validate(ID_FIELD, Some(raw)) {
            Ok(Some(id)) => Ok(id),
            _ => Err(ModelError::InvalidId(raw.to_string())),
        }
    }

    /// Validates every declared field and assembles the document to persist.
    fn validated_document(&self) -> ModelResult<Document> {
        self.check_init()?;

        let mut document = Document::new();
        for binding in self.schema.bindings() {
            let validated = binding
                .field()
                .validate(binding.name(), self.values.get(binding.name()))?;

            if let Some(value) = validated {
                document.insert(binding.name(), value);
            }
        }

        Ok(document)
    }

    /// Persists the instance: inserts when it has no `_id`, updates otherwise.
    ///
    /// Validation runs first in both branches; nothing reaches the store when
    /// any field fails. A fresh insert writes the assigned id back into the
    /// instance.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotInitialized`] when [`init`](ModelInstance::init) never ran.
    /// - [`ModelError::Validation`] when a field fails its strict rule.
    /// - [`ModelError::Store`] when the store call fails.
    pub async fn save<C>(&mut self, client: &C) -> ModelResult<()>
    where
        C: StoreClient,
    {
        let mut document = self.validated_document()?;

        match document.remove(ID_FIELD) {
            Some(id) => {
                // The id stays out of the $set payload; stores treat it as immutable.
                let update = UpdateSpec {
                    set: document,
                    unset: Vec::new(),
                };
                client
                    .update_one(&self.namespace, doc! { ID_FIELD: id }, update)
                    .await?;
            }
            None => {
                let result = client.insert_one(&self.namespace, document).await?;
                self.values
                    .insert(ID_FIELD.to_string(), Bson::ObjectId(result.inserted_id));
            }
        }

        Ok(())
    }

    /// Applies a validated partial update to the persisted document.
    ///
    /// Each patch entry is validated against its field; entries that validate
    /// to nothing (or to `Null`) become unsets, the rest become sets. The
    /// whole patch goes to the store as one operation, and local values are
    /// mirrored only after the store accepts it.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotPersisted`] when the instance has no `_id`.
    /// - [`ModelError::UnknownField`] when a patch key was never declared.
    /// - [`ModelError::Validation`] when a patch value fails its field's rule.
    pub async fn update<C>(&mut self, client: &C, patch: Document) -> ModelResult<UpdateResult>
    where
        C: StoreClient,
    {
        self.check_init()?;
        let id = self.require_persisted_id()?;

        let mut update = UpdateSpec::new();
        for (name, value) in &patch {
            let field = self
                .schema
                .get(name)
                .ok_or_else(|| ModelError::UnknownField(name.clone()))?;

            // A Null patch value clears the field instead of setting it.
            if matches!(value, Bson::Null) {
                update.unset.push(name.clone());
                continue;
            }

            match field.validate(name, Some(value))? {
                Some(Bson::Null) | None => update.unset.push(name.clone()),
                Some(validated) => {
                    update.set.insert(name.clone(), validated);
                }
            }
        }

        let result = client
            .update_one(&self.namespace, doc! { ID_FIELD: id }, update.clone())
            .await?;

        for (name, value) in update.set {
            self.values.insert(name, value);
        }
        for name in update.unset {
            self.values.remove(&name);
        }

        Ok(result)
    }

    /// Removes the persisted document from the store.
    ///
    /// The instance keeps its local values, `_id` included.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NotPersisted`] when the instance has no `_id`.
    /// - [`ModelError::InvalidId`] when the held `_id` is not a valid object id.
    pub async fn delete<C>(&self, client: &C) -> ModelResult<DeleteResult>
    where
        C: StoreClient,
    {
        self.check_init()?;
        let id = self.require_persisted_id()?;

        client
            .delete_one(&self.namespace, doc! { ID_FIELD: id })
            .await
    }

    /// Renders the instance as a document of coerced values.
    ///
    /// Read-path counterpart of the write-path validation: every declared
    /// field is coerced, fields that coerce to nothing are omitted.
    pub fn to_obj(&self) -> Document {
        let mut document = Document::new();

        for binding in self.schema.bindings() {
            let coerced = binding.field().coerce(self.values.get(binding.name()));
            if let Some(value) = coerced {
                document.insert(binding.name(), value);
            }
        }

        document
    }

    /// Renders the coerced document as a JSON value.
    pub fn to_json(&self) -> ModelResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_obj())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    fn users_model() -> Model {
        Model::new(
            Namespace::new("appdb", "users"),
            Schema::builder()
                .field("name", Field::string().required())
                .field("age", Field::number().min(0).default_value(0))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn create_drops_unknown_keys_and_applies_defaults() {
        let model = users_model();
        let instance = model.create(doc! { "name": "Alice", "extra": true });

        assert_eq!(instance.get("name"), Some(&Bson::String("Alice".into())));
        assert_eq!(instance.get("age"), Some(&Bson::Int32(0)));
        assert_eq!(instance.get("extra"), None);
    }

    #[test]
    fn set_rejects_undeclared_fields() {
        let model = users_model();
        let mut instance = model.create(doc! { "name": "Alice" });

        assert!(instance.set("age", 31).is_ok());
        assert!(matches!(
            instance.set("nickname", "Al"),
            Err(ModelError::UnknownField(_)),
        ));
    }

    #[test]
    fn uninitialized_instance_fails_validation() {
        let model = users_model();
        let instance = model.instance();

        assert!(matches!(
            instance.validated_document(),
            Err(ModelError::NotInitialized),
        ));
    }

    #[test]
    fn validated_document_coerces_and_checks() {
        let model = users_model();
        let instance = model.create(doc! { "name": "Alice", "age": "42" });
        let document = instance.validated_document().unwrap();

        assert_eq!(document.get("age"), Some(&Bson::Int64(42)));
        assert_eq!(document.get("name"), Some(&Bson::String("Alice".into())));
    }

    #[test]
    fn missing_required_field_fails_validation() {
        let model = users_model();
        let instance = model.create(doc! { "age": 5 });

        assert!(matches!(
            instance.validated_document(),
            Err(ModelError::Validation { .. }),
        ));
    }

    #[test]
    fn fresh_instance_has_no_id() {
        let model = users_model();
        let instance = model.create(doc! { "name": "Alice" });

        assert_eq!(instance.id(), None);
        assert!(matches!(
            instance.require_persisted_id(),
            Err(ModelError::NotPersisted),
        ));
    }

    #[test]
    fn to_obj_omits_unset_optional_fields() {
        let model = Model::new(
            Namespace::new("appdb", "users"),
            Schema::builder()
                .field("name", Field::string())
                .field("bio", Field::string())
                .build()
                .unwrap(),
        );
        let instance = model.create(doc! { "name": "Alice" });
        let obj = instance.to_obj();

        assert_eq!(obj.get("name"), Some(&Bson::String("Alice".into())));
        assert!(!obj.contains_key("bio"));
        assert!(!obj.contains_key(ID_FIELD));
    }

    #[test]
    fn to_json_renders_coerced_values() {
        let model = users_model();
        let instance = model.create(doc! { "name": "Alice", "age": "7" });
        let json = instance.to_json().unwrap();

        assert_eq!(json["name"], serde_json::json!("Alice"));
        assert_eq!(json["age"], serde_json::json!(7));
    }
}
