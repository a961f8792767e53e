//! The field type system: typed value descriptors with coercion and validation.
//!
//! A [`Field`] pairs a [`FieldKind`] (the type tag) with the modifiers that
//! govern a single model attribute: a default value, a required flag, and
//! optional bounds. Every field offers two operations driven by the same
//! per-kind decision table:
//!
//! - [`Field::coerce`] — lossy, best-effort conversion used on the read path;
//!   never fails, falls back to the declared default.
//! - [`Field::validate`] — strict conversion used on the write path; fails
//!   with [`ModelError::Validation`] on any violation.
//!
//! # Example
//!
//! ```ignore
//! use fieldlayer_core::field::Field;
//! use bson::Bson;
//!
//! let age = Field::number().min(0).max(150);
//! assert_eq!(age.coerce(Some(&Bson::String("42".into()))), Some(Bson::Int64(42)));
//! assert!(age.validate("age", Some(&Bson::String("very old".into()))).is_err());
//! ```

use bson::{Bson, DateTime, oid::ObjectId};
use chrono::DateTime as ChronoDateTime;

use crate::error::{ModelError, ModelResult};

/// The eight field type kinds a model attribute can be declared with.
///
/// Structural constraints live on the variant that needs them: array fields
/// carry their allowed item kinds, enum fields carry their member domain.
/// Adding a new kind means adding one variant and one arm in the shared
/// decision table, not editing a chain of comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Pass-through; any BSON value is accepted unchanged.
    Any,
    /// UTF-8 string; scalar inputs are stringified.
    String,
    /// Numeric; integral results are stored as `Int64`, others as `Double`.
    Number,
    /// Point in time; constructed from RFC 3339 strings or millisecond integers.
    Date,
    /// BSON object id; constructed from 24-char hex or 12-byte string forms.
    ObjectId,
    /// A plain key-value document.
    Object,
    /// A sequence; when `item_kinds` is non-empty, every element must match
    /// one of the declared kinds on the validate path.
    Array {
        /// Allowed element kinds; empty means unconstrained.
        item_kinds: Vec<FieldKind>,
    },
    /// A closed value domain; the member list is non-empty by construction.
    Enum {
        /// The allowed values, in declaration order.
        members: Vec<Bson>,
    },
}

/// A typed value descriptor governing coercion and validation of one model attribute.
///
/// Fields are immutable once bound into a schema. Construct them with the
/// per-kind factories and chainable modifiers:
///
/// ```ignore
/// let status = Field::enumeration(["active", "banned"])?
///     .default_value("active");
/// let name = Field::string().required();
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    default: Option<Bson>,
    required: bool,
    min: Option<Bson>,
    max: Option<Bson>,
}

impl Field {
    fn with_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            default: None,
            required: false,
            min: None,
            max: None,
        }
    }

    /// Creates an untyped pass-through field.
    pub fn any() -> Self {
        Self::with_kind(FieldKind::Any)
    }

    /// Creates a string field.
    pub fn string() -> Self {
        Self::with_kind(FieldKind::String)
    }

    /// Creates a numeric field.
    pub fn number() -> Self {
        Self::with_kind(FieldKind::Number)
    }

    /// Creates a date field.
    pub fn date() -> Self {
        Self::with_kind(FieldKind::Date)
    }

    /// Creates an object-id field.
    pub fn object_id() -> Self {
        Self::with_kind(FieldKind::ObjectId)
    }

    /// Creates a field holding a plain key-value document.
    pub fn object() -> Self {
        Self::with_kind(FieldKind::Object)
    }

    /// Creates an array field with unconstrained elements.
    pub fn array() -> Self {
        Self::with_kind(FieldKind::Array { item_kinds: Vec::new() })
    }

    /// Creates an array field whose elements must match one of the given kinds.
    pub fn array_of(item_kinds: impl IntoIterator<Item = FieldKind>) -> Self {
        Self::with_kind(FieldKind::Array {
            item_kinds: item_kinds.into_iter().collect(),
        })
    }

    /// Creates an enum field over the given member domain.
    ///
    /// # Errors
    ///
    /// Fails with [`ModelError::Schema`] when the member list is empty; an
    /// enum with no members could never validate any value.
    pub fn enumeration(
        members: impl IntoIterator<Item = impl Into<Bson>>,
    ) -> ModelResult<Self> {
        let members = members
            .into_iter()
            .map(Into::into)
            .collect::<Vec<Bson>>();

        if members.is_empty() {
            return Err(ModelError::Schema(
                "enum field requires a non-empty member list".to_string(),
            ));
        }

        Ok(Self::with_kind(FieldKind::Enum { members }))
    }

    /// Marks the field as required: an absent value at write time is an error.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the value substituted when input is absent.
    pub fn default_value(mut self, value: impl Into<Bson>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the lower bound, enforced on validate for number and date fields.
    pub fn min(mut self, value: impl Into<Bson>) -> Self {
        self.min = Some(value.into());
        self
    }

    /// Sets the upper bound, enforced on validate for number and date fields.
    pub fn max(mut self, value: impl Into<Bson>) -> Self {
        self.max = Some(value.into());
        self
    }

    /// Returns this field's type kind.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Returns this field's declared default, if any.
    pub fn default(&self) -> Option<&Bson> {
        self.default.as_ref()
    }

    /// Returns whether an absent value fails validation.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Lossy, best-effort conversion of a raw value into this field's type.
    ///
    /// Never fails: absent input yields the declared default, and input the
    /// kind cannot represent falls back to the default (object-id inputs that
    /// don't parse yield `None`; enum values outside the domain fall back to
    /// the default or the first member).
    pub fn coerce(&self, value: Option<&Bson>) -> Option<Bson> {
        let Some(value) = value else {
            return self.default.clone();
        };

        match &self.kind {
            FieldKind::Any => Some(value.clone()),
            FieldKind::String => Some(Bson::String(stringify(value))),
            FieldKind::Number => parse_number(value)
                .map(number_to_bson)
                .or_else(|| self.default.clone()),
            FieldKind::Date => parse_date(value)
                .map(Bson::DateTime)
                .or_else(|| self.default.clone()),
            FieldKind::ObjectId => parse_object_id(value).map(Bson::ObjectId),
            FieldKind::Object | FieldKind::Array { .. } => Some(value.clone()),
            FieldKind::Enum { members } => {
                if members.contains(value) {
                    Some(value.clone())
                } else {
                    self.default
                        .clone()
                        .or_else(|| members.first().cloned())
                }
            }
        }
    }

    /// Strict conversion/check of a value against this field's type.
    ///
    /// Shares the per-kind decision table with [`Field::coerce`] but raises
    /// [`ModelError::Validation`] instead of falling back:
    ///
    /// - a required field with absent input fails (before default substitution),
    /// - an absent non-required value yields the declared default,
    /// - per-kind shape violations fail,
    /// - declared `min`/`max` bounds are enforced for number and date fields,
    /// - declared array item kinds are enforced element-wise.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Validation`] naming the field on any violation.
    pub fn validate(&self, name: &str, value: Option<&Bson>) -> ModelResult<Option<Bson>> {
        if self.required && value.is_none() {
            return Err(invalid(name, "value is required"));
        }

        let Some(value) = value else {
            return Ok(self.default.clone());
        };

        let validated = match &self.kind {
            FieldKind::Any => value.clone(),
            FieldKind::String => Bson::String(stringify(value)),
            FieldKind::Number => {
                let number = parse_number(value)
                    .ok_or_else(|| invalid(name, format!("{value} is not a number")))?;

                self.check_number_bounds(name, number)?;
                number_to_bson(number)
            }
            FieldKind::Date => {
                let date = parse_date(value)
                    .ok_or_else(|| invalid(name, format!("{value} is not a date")))?;

                self.check_date_bounds(name, date)?;
                Bson::DateTime(date)
            }
            FieldKind::ObjectId => Bson::ObjectId(
                parse_object_id(value)
                    .ok_or_else(|| invalid(name, format!("{value} is not a valid object id")))?,
            ),
            FieldKind::Object => match value {
                Bson::Document(_) => value.clone(),
                _ => return Err(invalid(name, format!("{value} is not an object"))),
            },
            FieldKind::Array { item_kinds } => match value {
                Bson::Array(items) => {
                    if !item_kinds.is_empty() {
                        for item in items {
                            if !item_kinds.iter().any(|kind| matches_kind(item, kind)) {
                                return Err(invalid(
                                    name,
                                    format!("{item} does not match the declared item kinds"),
                                ));
                            }
                        }
                    }

                    value.clone()
                }
                _ => return Err(invalid(name, format!("{value} is not an array"))),
            },
            FieldKind::Enum { members } => {
                if members.contains(value) {
                    value.clone()
                } else {
                    return Err(invalid(name, format!("{value} is not a member of the enum")));
                }
            }
        };

        Ok(Some(validated))
    }

    fn check_number_bounds(&self, name: &str, number: f64) -> ModelResult<()> {
        if let Some(min) = self.min.as_ref().and_then(parse_number) {
            if number < min {
                return Err(invalid(name, format!("{number} is below the minimum {min}")));
            }
        }

        if let Some(max) = self.max.as_ref().and_then(parse_number) {
            if number > max {
                return Err(invalid(name, format!("{number} is above the maximum {max}")));
            }
        }

        Ok(())
    }

    fn check_date_bounds(&self, name: &str, date: DateTime) -> ModelResult<()> {
        if let Some(min) = self.min.as_ref().and_then(parse_date) {
            if date < min {
                return Err(invalid(name, format!("{date} is before the minimum {min}")));
            }
        }

        if let Some(max) = self.max.as_ref().and_then(parse_date) {
            if date > max {
                return Err(invalid(name, format!("{date} is after the maximum {max}")));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ModelError {
    ModelError::Validation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn stringify(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::Int32(v) => v.to_string(),
        Bson::Int64(v) => v.to_string(),
        Bson::Double(v) => v.to_string(),
        Bson::Boolean(v) => v.to_string(),
        other => other.to_string(),
    }
}

fn parse_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        Bson::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn number_to_bson(value: f64) -> Bson {
    // Integral results are stored as integers, everything else as doubles.
    if value.is_finite() && value.fract() == 0.0 && value.abs() <= i64::MAX as f64 {
        Bson::Int64(value as i64)
    } else {
        Bson::Double(value)
    }
}

fn parse_date(value: &Bson) -> Option<DateTime> {
    match value {
        Bson::DateTime(dt) => Some(*dt),
        Bson::String(s) => ChronoDateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| DateTime::from_millis(dt.timestamp_millis())),
        Bson::Int32(v) => Some(DateTime::from_millis(*v as i64)),
        Bson::Int64(v) => Some(DateTime::from_millis(*v)),
        _ => None,
    }
}

fn parse_object_id(value: &Bson) -> Option<ObjectId> {
    match value {
        Bson::ObjectId(oid) => Some(*oid),
        // Only the two canonical string widths are accepted: 24 hex chars
        // or 12 raw bytes.
        Bson::String(s) if s.len() == 24 => ObjectId::parse_str(s).ok(),
        Bson::String(s) if s.len() == 12 => {
            let bytes: [u8; 12] = s.as_bytes().try_into().ok()?;
            Some(ObjectId::from_bytes(bytes))
        }
        _ => None,
    }
}

fn matches_kind(value: &Bson, kind: &FieldKind) -> bool {
    match kind {
        FieldKind::Any => true,
        FieldKind::String => matches!(value, Bson::String(_)),
        FieldKind::Number => matches!(value, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)),
        FieldKind::Date => matches!(value, Bson::DateTime(_)),
        FieldKind::ObjectId => matches!(value, Bson::ObjectId(_)),
        FieldKind::Object => matches!(value, Bson::Document(_)),
        FieldKind::Array { .. } => matches!(value, Bson::Array(_)),
        FieldKind::Enum { members } => members.contains(value),
    }
}
