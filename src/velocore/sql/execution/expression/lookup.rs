//! Field lookup against records.
//!
//! The evaluator never reads `StreamRecord::fields` directly; it goes through a
//! [`FieldLookup`] so callers can plug in schema checks.

use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::types::{FieldKind, FieldValue, StreamRecord};
use std::collections::HashMap;

/// Resolves a field name against a record.
pub trait FieldLookup {
    /// Return the field's value, or a lookup error when it is absent or mistyped.
    fn lookup(&self, field: &str, record: &StreamRecord) -> SqlResult<FieldValue>;
}

/// Plain lookup by field name.
///
/// An exact field name wins. Otherwise a dotted name walks into nested values:
/// `stats.max` reads key `max` of map field `stats`, `tags.0` reads the first
/// element of list field `tags`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordLookup;

impl FieldLookup for RecordLookup {
    fn lookup(&self, field: &str, record: &StreamRecord) -> SqlResult<FieldValue> {
        if let Some(value) = record.get_field(field) {
            return Ok(value.clone());
        }
        if !field.contains('.') {
            return Err(SqlError::lookup_error(field, "field not present in record"));
        }

        let mut segments = field.split('.');
        let head = segments.next().unwrap_or(field);
        let mut current = record
            .get_field(head)
            .ok_or_else(|| SqlError::lookup_error(field, "field not present in record"))?;
        for segment in segments {
            current = match current {
                FieldValue::Map(map) => map.get(segment).ok_or_else(|| {
                    SqlError::lookup_error(field, format!("map has no key '{}'", segment))
                })?,
                FieldValue::List(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index))
                    .ok_or_else(|| {
                        SqlError::lookup_error(field, format!("list has no index '{}'", segment))
                    })?,
                other => {
                    return Err(SqlError::lookup_error(
                        field,
                        format!("cannot index into {}", other.type_name()),
                    ));
                }
            };
        }
        Ok(current.clone())
    }
}

/// Lookup that checks values against a declared schema.
///
/// Fields that the schema does not declare resolve exactly as with
/// [`RecordLookup`]; a declared field whose non-null value has a different kind
/// is a lookup error.
#[derive(Debug, Clone, Default)]
pub struct SchemaLookup {
    schema: HashMap<String, FieldKind>,
}

impl SchemaLookup {
    pub fn new(schema: HashMap<String, FieldKind>) -> Self {
        Self { schema }
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.schema.insert(name.into(), kind);
        self
    }

    pub fn declared_kind(&self, field: &str) -> Option<FieldKind> {
        self.schema.get(field).copied()
    }
}

impl FieldLookup for SchemaLookup {
    fn lookup(&self, field: &str, record: &StreamRecord) -> SqlResult<FieldValue> {
        let value = RecordLookup.lookup(field, record)?;
        match self.schema.get(field) {
            Some(kind) if !value.is_null() && value.kind() != *kind => {
                Err(SqlError::lookup_error(
                    field,
                    format!("schema declares {}, record holds {}", kind, value.kind()),
                ))
            }
            _ => Ok(value),
        }
    }
}
