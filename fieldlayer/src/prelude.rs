//! Convenience re-exports for the common surface.
//!
//! ```ignore
//! use fieldlayer::prelude::*;
//! ```

pub use fieldlayer_core::{
    client::{
        DeleteResult, FindOptions, InsertManyResult, InsertOneResult, StoreClient,
        StoreClientBuilder, UpdateResult, UpdateSpec,
    },
    error::{ModelError, ModelResult},
    field::{Field, FieldKind},
    model::{Model, ModelInstance},
    schema::{ID_FIELD, Namespace, Schema, SchemaBuilder},
};
