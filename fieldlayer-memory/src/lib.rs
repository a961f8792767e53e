//! In-memory store client for the fieldlayer object-document mapping layer.
//!
//! Provides [`InMemoryClient`](store::InMemoryClient), a thread-safe,
//! process-local implementation of the
//! [`StoreClient`](fieldlayer_core::client::StoreClient) trait. Useful for
//! tests and development setups where a real database is unwanted.

mod matcher;
pub mod store;

pub use store::{InMemoryClient, InMemoryClientBuilder};
