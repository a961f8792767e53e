//! Schema declaration: named field bindings and the namespace a model writes to.
//!
//! A [`Schema`] is an ordered set of [`FieldBinding`]s built through
//! [`SchemaBuilder`]. Construction is the only place schema-shape errors can
//! arise; once built, a schema is immutable and shared by every instance of
//! its model.

use std::fmt;

use crate::error::{ModelError, ModelResult};
use crate::field::Field;

/// The reserved identity field present on every schema.
pub const ID_FIELD: &str = "_id";

/// A field descriptor bound to its name within a schema.
#[derive(Debug, Clone)]
pub struct FieldBinding {
    name: String,
    field: Field,
}

impl FieldBinding {
    /// Returns the bound field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the field descriptor.
    pub fn field(&self) -> &Field {
        &self.field
    }
}

/// An ordered, immutable set of field bindings describing a model's shape.
///
/// Every schema carries an `_id` object-id binding; the builder prepends one
/// when the caller doesn't declare it.
#[derive(Debug, Clone)]
pub struct Schema {
    bindings: Vec<FieldBinding>,
}

impl Schema {
    /// Creates a new builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Returns the bindings in declaration order, `_id` first.
    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    /// Looks up a field descriptor by name.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.bindings
            .iter()
            .find(|binding| binding.name == name)
            .map(|binding| &binding.field)
    }

    /// Returns whether a field with the given name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.iter().any(|binding| binding.name == name)
    }
}

/// Builder for [`Schema`].
///
/// ```ignore
/// let schema = Schema::builder()
///     .field("name", Field::string().required())
///     .field("age", Field::number().min(0))
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    bindings: Vec<FieldBinding>,
}

impl SchemaBuilder {
    /// Declares a field under the given name.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.bindings.push(FieldBinding {
            name: name.into(),
            field,
        });
        self
    }

    /// Finalizes the schema.
    ///
    /// # Errors
    ///
    /// Fails with [`ModelError::Schema`] when two bindings share a name.
    pub fn build(mut self) -> ModelResult<Schema> {
        for (i, binding) in self.bindings.iter().enumerate() {
            if self.bindings[..i].iter().any(|b| b.name == binding.name) {
                return Err(ModelError::Schema(format!(
                    "duplicate field name {}",
                    binding.name
                )));
            }
        }

        if !self.bindings.iter().any(|b| b.name == ID_FIELD) {
            self.bindings.insert(
                0,
                FieldBinding {
                    name: ID_FIELD.to_string(),
                    field: Field::object_id(),
                },
            );
        }

        Ok(Schema {
            bindings: self.bindings,
        })
    }
}

/// The database and collection a model's documents live in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// The database name.
    pub database: String,
    /// The collection name within the database.
    pub collection: String,
}

impl Namespace {
    /// Creates a namespace from a database and collection name.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}
