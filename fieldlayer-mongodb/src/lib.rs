//! MongoDB store client for the fieldlayer object-document mapping layer.
//!
//! Provides [`MongoStoreClient`](store::MongoStoreClient), an implementation
//! of the [`StoreClient`](fieldlayer_core::client::StoreClient) trait backed
//! by the official MongoDB driver. Build one from a connection string via
//! [`MongoStoreBuilder`](store::MongoStoreBuilder).

pub mod store;

pub use store::{MongoStoreBuilder, MongoStoreClient};
