//! Filter matching for in-memory document lookups.
//!
//! Filters are plain documents matched by top-level key equality, the same
//! shape the model engine produces (`{ "_id": <oid> }` and friends).

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

/// Type-erased, comparable representation of BSON values.
///
/// Normalizes all numeric widths to f64 so that an `Int32` filter value
/// matches an `Int64` stored value.
#[derive(Debug)]
pub(crate) enum Normalized<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Array(Vec<Normalized<'a>>),
    Map(HashMap<&'a str, Normalized<'a>>),
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Normalized<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Normalized::Null,
            Bson::Boolean(value) => Normalized::Bool(*value),
            Bson::Int32(value) => Normalized::Number(*value as f64),
            Bson::Int64(value) => Normalized::Number(*value as f64),
            Bson::Double(value) => Normalized::Number(*value),
            Bson::DateTime(value) => Normalized::DateTime(*value),
            Bson::String(value) => Normalized::String(value),
            Bson::ObjectId(value) => Normalized::ObjectId(*value),
            Bson::Array(arr) => Normalized::Array(arr.iter().map(Normalized::from).collect()),
            Bson::Document(doc) => Normalized::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Normalized::from(v)))
                    .collect(),
            ),
            other => Normalized::Other(other),
        }
    }
}

impl<'a> PartialEq for Normalized<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Normalized::Null, Normalized::Null) => true,
            (Normalized::Bool(a), Normalized::Bool(b)) => a == b,
            (Normalized::Number(a), Normalized::Number(b)) => a == b,
            (Normalized::DateTime(a), Normalized::DateTime(b)) => a == b,
            (Normalized::String(a), Normalized::String(b)) => a == b,
            (Normalized::ObjectId(a), Normalized::ObjectId(b)) => a == b,
            (Normalized::Array(a), Normalized::Array(b)) => a == b,
            (Normalized::Map(a), Normalized::Map(b)) => a == b,
            (Normalized::Other(a), Normalized::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Normalized<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Normalized::Number(a), Normalized::Number(b)) => a.partial_cmp(b),
            (Normalized::DateTime(a), Normalized::DateTime(b)) => a.partial_cmp(b),
            (Normalized::String(a), Normalized::String(b)) => a.partial_cmp(b),
            (Normalized::Bool(a), Normalized::Bool(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Normalized equality between two BSON values.
pub(crate) fn bson_eq(left: &Bson, right: &Bson) -> bool {
    Normalized::from(left) == Normalized::from(right)
}

/// Returns whether `document` satisfies every top-level key of `filter`.
///
/// An empty filter matches everything.
pub(crate) fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| {
        document
            .get(key)
            .is_some_and(|actual| bson_eq(actual, expected))
    })
}
