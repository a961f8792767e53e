//! Error types and result types for model and store operations.
//!
//! This module provides the error taxonomy for the whole model engine.
//! Use [`ModelResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors raised by the field/model engine or a store client.
///
/// Schema and validation failures are local and synchronous; store failures are
/// propagated from the store client unchanged and never retried here.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A malformed field or schema declaration (e.g. an enum field with an
    /// empty member list, or a duplicate field name). Raised at declaration
    /// time, before any instance exists.
    #[error("Schema error: {0}")]
    Schema(String),
    /// A field value failed its type's strict rule, or a required field was
    /// absent at write time. No store call is issued after this.
    #[error("Validation failed for field {field}: {reason}")]
    Validation {
        /// The name of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// A persistence operation was invoked on an instance that never ran `init`.
    #[error("Model instance has not been initialized")]
    NotInitialized,
    /// An update or delete was invoked on an instance whose `_id` is unset.
    #[error("Model instance has no _id; it has never been persisted")]
    NotPersisted,
    /// The instance's `_id` failed object-id validation on delete.
    #[error("{0} is not a valid object id")]
    InvalidId(String),
    /// A batch insert received an instance that already carries an `_id`.
    #[error("Document already has _id {0}")]
    AlreadyPersisted(String),
    /// An update patch referenced a field the model never declared.
    #[error("Field {0} does not exist in model")]
    UnknownField(String),
    /// The store client's call failed or rejected; propagated unchanged.
    #[error("Store error: {0}")]
    Store(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for model and store operations.
///
/// This type alias is used throughout the workspace to indicate operations
/// that may fail with a [`ModelError`].
pub type ModelResult<T> = Result<T, ModelError>;

impl From<BsonError> for ModelError {
    fn from(err: BsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ModelError {
    fn from(err: SerdeJsonError) -> Self {
        ModelError::Serialization(err.to_string())
    }
}
