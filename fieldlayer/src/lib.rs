//! A lightweight object-document mapping layer for document stores.
//!
//! Declare typed fields on a model through an explicit schema builder, then
//! let the model engine coerce, validate, and persist instances as BSON
//! documents against any [`StoreClient`](client::StoreClient). The engine
//! never holds a connection of its own; every operation takes the client
//! explicitly, so the same model runs against the bundled in-memory client
//! in tests and MongoDB in production.
//!
//! # Quick start
//!
//! ```ignore
//! use fieldlayer::{prelude::*, memory::InMemoryClient};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> ModelResult<()> {
//!     let client = InMemoryClient::new();
//!
//!     let users = Model::new(
//!         Namespace::new("appdb", "users"),
//!         Schema::builder()
//!             .field("name", Field::string().required())
//!             .field("age", Field::number().min(0))
//!             .build()?,
//!     );
//!
//!     let mut alice = users.create(doc! { "name": "Alice", "age": 30 });
//!     alice.save(&client).await?;
//!
//!     let found = users.find_by_id(&client, alice.id().unwrap()).await?;
//!     println!("{:?}", found.map(|u| u.to_obj()));
//!
//!     Ok(())
//! }
//! ```
//!
//! # Feature flags
//!
//! - `mongodb` — enables the [`mongodb`] module with the MongoDB-backed
//!   store client.

pub use bson;

pub use fieldlayer_core::{client, error, field, model, schema};

/// The in-memory store client, for tests and development.
pub mod memory {
    pub use fieldlayer_memory::{InMemoryClient, InMemoryClientBuilder};
}

/// The MongoDB store client.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use fieldlayer_mongodb::{MongoStoreBuilder, MongoStoreClient};
}

pub mod prelude;
