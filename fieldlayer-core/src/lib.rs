//! Core building blocks of the fieldlayer object-document mapping layer.
//!
//! This crate carries the pieces every store client and every model shares:
//!
//! - [`field`] — the field type system: [`Field`](field::Field) descriptors
//!   with lossy coercion and strict validation over eight type kinds
//! - [`schema`] — [`Schema`](schema::Schema) declaration and the
//!   [`Namespace`](schema::Namespace) a model writes to
//! - [`model`] — the engine: [`Model`](model::Model) collection handles and
//!   [`ModelInstance`](model::ModelInstance) persistence
//! - [`client`] — the [`StoreClient`](client::StoreClient) abstraction the
//!   engine drives, with its result and option types
//! - [`error`] — the [`ModelError`](error::ModelError) taxonomy
//!
//! Store client implementations live in sibling crates; see the facade crate
//! for the assembled surface.

extern crate self as fieldlayer_core;

pub mod client;
pub mod error;
pub mod field;
pub mod model;
pub mod schema;
