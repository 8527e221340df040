//! Core execution data types.
//!
//! This module contains the fundamental data types used throughout the execution core:
//! - [`FieldKind`] - The kind tag of a value, including the numeric widening order
//! - [`FieldValue`] - The typed scalar (or container) value with casting and arithmetic
//! - [`StreamRecord`] - A mutable record addressable by field name
//! - [`Clip`] - An ordered batch of records plus result metadata

use crate::velocore::sql::ast::BinaryOperator;
use crate::velocore::sql::error::{SqlError, SqlResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Kind tag of a [`FieldValue`].
///
/// Numeric kinds form the strict widening order
/// `INTEGER < LONG < FLOAT < DOUBLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Null,
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    String,
    List,
    Map,
}

impl FieldKind {
    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Position in the widening order, `None` for non-numeric kinds.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            FieldKind::Integer => Some(0),
            FieldKind::Long => Some(1),
            FieldKind::Float => Some(2),
            FieldKind::Double => Some(3),
            _ => None,
        }
    }

    pub fn is_integral(&self) -> bool {
        matches!(self, FieldKind::Integer | FieldKind::Long)
    }

    /// Result kind of binary arithmetic between `left` and `right`: the wider
    /// of the two. Fails when either kind is not numeric.
    pub fn result_kind(left: FieldKind, right: FieldKind) -> SqlResult<FieldKind> {
        match (left.numeric_rank(), right.numeric_rank()) {
            (Some(l), Some(r)) => Ok(if l >= r { left } else { right }),
            (None, _) => Err(SqlError::type_error("numeric", left.to_string(), None)),
            (_, None) => Err(SqlError::type_error("numeric", right.to_string(), None)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Null => "NULL",
            FieldKind::Boolean => "BOOLEAN",
            FieldKind::Integer => "INTEGER",
            FieldKind::Long => "LONG",
            FieldKind::Float => "FLOAT",
            FieldKind::Double => "DOUBLE",
            FieldKind::String => "STRING",
            FieldKind::List => "LIST",
            FieldKind::Map => "MAP",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldKind {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NULL" => Ok(FieldKind::Null),
            "BOOLEAN" | "BOOL" => Ok(FieldKind::Boolean),
            "INTEGER" | "INT" => Ok(FieldKind::Integer),
            "LONG" | "BIGINT" => Ok(FieldKind::Long),
            "FLOAT" => Ok(FieldKind::Float),
            "DOUBLE" => Ok(FieldKind::Double),
            "STRING" | "VARCHAR" | "TEXT" => Ok(FieldKind::String),
            "LIST" | "ARRAY" => Ok(FieldKind::List),
            "MAP" => Ok(FieldKind::Map),
            other => Err(SqlError::type_error(
                "a field kind",
                "unknown",
                Some(other.to_string()),
            )),
        }
    }
}

/// A value in a record field
///
/// The payload always matches the kind reported by [`FieldValue::kind`].
/// Values are immutable once built; every operation returns a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// NULL value
    Null,
    /// Boolean value (true/false)
    Boolean(bool),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point number
    Float(f32),
    /// 64-bit floating point number
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Ordered list of values
    List(Vec<FieldValue>),
    /// String-keyed map, iterated in key order
    Map(BTreeMap<String, FieldValue>),
}

/// Display implementation for FieldValue for clean string formatting
impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Long(l) => write!(f, "{}", l),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Double(v) => write!(f, "{}", v),
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            FieldValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Null => FieldKind::Null,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Long(_) => FieldKind::Long,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Double(_) => FieldKind::Double,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::List(_) => FieldKind::List,
            FieldValue::Map(_) => FieldKind::Map,
        }
    }

    /// Get the type name for error messages and debugging
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Check if this value can take part in arithmetic.
    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Parse a literal's textual payload into a value of `kind`.
    ///
    /// Quote characters around string literals must already be stripped.
    pub fn parse_literal(text: &str, kind: FieldKind) -> SqlResult<FieldValue> {
        let invalid = || {
            SqlError::execution_error(format!("Invalid {} literal: {}", kind, text), None)
        };
        match kind {
            FieldKind::Null => Ok(FieldValue::Null),
            FieldKind::String => Ok(FieldValue::String(text.to_string())),
            FieldKind::Boolean => match text.trim().to_lowercase().as_str() {
                "true" => Ok(FieldValue::Boolean(true)),
                "false" => Ok(FieldValue::Boolean(false)),
                _ => Err(invalid()),
            },
            FieldKind::Integer => text
                .trim()
                .parse::<i32>()
                .map(FieldValue::Integer)
                .map_err(|_| invalid()),
            FieldKind::Long => text
                .trim()
                .parse::<i64>()
                .map(FieldValue::Long)
                .map_err(|_| invalid()),
            FieldKind::Float => text
                .trim()
                .parse::<f32>()
                .map(FieldValue::Float)
                .map_err(|_| invalid()),
            FieldKind::Double => text
                .trim()
                .parse::<f64>()
                .map(FieldValue::Double)
                .map_err(|_| invalid()),
            FieldKind::List | FieldKind::Map => Err(SqlError::type_error(
                "a scalar literal kind",
                kind.to_string(),
                Some(text.to_string()),
            )),
        }
    }

    /// Cast this value to `target`, failing instead of coercing permissively.
    ///
    /// Floating to integral conversions truncate toward zero and saturate at the
    /// target bounds (NaN becomes 0). LONG to INTEGER keeps the low 32 bits.
    /// NULL casts to NULL for every target.
    pub fn cast_to(self, target: FieldKind) -> SqlResult<FieldValue> {
        if self.kind() == target || self.is_null() {
            return Ok(self);
        }
        let fail = |value: &FieldValue| {
            SqlError::type_error(target.to_string(), value.type_name(), Some(value.to_string()))
        };
        match target {
            FieldKind::Integer => match self {
                FieldValue::Long(l) => Ok(FieldValue::Integer(l as i32)),
                FieldValue::Float(f) => Ok(FieldValue::Integer(f as i32)),
                FieldValue::Double(d) => Ok(FieldValue::Integer(d as i32)),
                FieldValue::Boolean(b) => Ok(FieldValue::Integer(i32::from(b))),
                FieldValue::String(ref s) => s
                    .trim()
                    .parse::<i32>()
                    .map(FieldValue::Integer)
                    .map_err(|_| fail(&self)),
                _ => Err(fail(&self)),
            },
            FieldKind::Long => match self {
                FieldValue::Integer(i) => Ok(FieldValue::Long(i64::from(i))),
                FieldValue::Float(f) => Ok(FieldValue::Long(f as i64)),
                FieldValue::Double(d) => Ok(FieldValue::Long(d as i64)),
                FieldValue::Boolean(b) => Ok(FieldValue::Long(i64::from(b))),
                FieldValue::String(ref s) => s
                    .trim()
                    .parse::<i64>()
                    .map(FieldValue::Long)
                    .map_err(|_| fail(&self)),
                _ => Err(fail(&self)),
            },
            FieldKind::Float => match self {
                FieldValue::Integer(i) => Ok(FieldValue::Float(i as f32)),
                FieldValue::Long(l) => Ok(FieldValue::Float(l as f32)),
                FieldValue::Double(d) => Ok(FieldValue::Float(d as f32)),
                FieldValue::Boolean(b) => Ok(FieldValue::Float(if b { 1.0 } else { 0.0 })),
                FieldValue::String(ref s) => s
                    .trim()
                    .parse::<f32>()
                    .map(FieldValue::Float)
                    .map_err(|_| fail(&self)),
                _ => Err(fail(&self)),
            },
            FieldKind::Double => match self {
                FieldValue::Integer(i) => Ok(FieldValue::Double(f64::from(i))),
                FieldValue::Long(l) => Ok(FieldValue::Double(l as f64)),
                FieldValue::Float(f) => Ok(FieldValue::Double(f64::from(f))),
                FieldValue::Boolean(b) => Ok(FieldValue::Double(if b { 1.0 } else { 0.0 })),
                FieldValue::String(ref s) => s
                    .trim()
                    .parse::<f64>()
                    .map(FieldValue::Double)
                    .map_err(|_| fail(&self)),
                _ => Err(fail(&self)),
            },
            FieldKind::Boolean => match self {
                FieldValue::Integer(i) => Ok(FieldValue::Boolean(i != 0)),
                FieldValue::Long(l) => Ok(FieldValue::Boolean(l != 0)),
                FieldValue::Float(f) => Ok(FieldValue::Boolean(f != 0.0)),
                FieldValue::Double(d) => Ok(FieldValue::Boolean(d != 0.0)),
                FieldValue::String(ref s) => match s.trim().to_uppercase().as_str() {
                    "TRUE" | "T" | "1" => Ok(FieldValue::Boolean(true)),
                    "FALSE" | "F" | "0" => Ok(FieldValue::Boolean(false)),
                    _ => Err(fail(&self)),
                },
                _ => Err(fail(&self)),
            },
            FieldKind::String => match self {
                FieldValue::List(_) | FieldValue::Map(_) => Err(fail(&self)),
                scalar => Ok(FieldValue::String(scalar.to_string())),
            },
            FieldKind::Null | FieldKind::List | FieldKind::Map => Err(fail(&self)),
        }
    }

    /// Add two values with numeric widening.
    pub fn add(&self, other: &FieldValue) -> SqlResult<FieldValue> {
        self.apply_arithmetic(BinaryOperator::Add, other)
    }

    /// Subtract `other` from this value with numeric widening.
    pub fn subtract(&self, other: &FieldValue) -> SqlResult<FieldValue> {
        self.apply_arithmetic(BinaryOperator::Subtract, other)
    }

    /// Multiply two values with numeric widening.
    pub fn multiply(&self, other: &FieldValue) -> SqlResult<FieldValue> {
        self.apply_arithmetic(BinaryOperator::Multiply, other)
    }

    /// Divide this value by `other`.
    ///
    /// Floor division when the result kind is INTEGER or LONG, true division
    /// otherwise. Integral division by zero is an execution error.
    pub fn divide(&self, other: &FieldValue) -> SqlResult<FieldValue> {
        self.apply_arithmetic(BinaryOperator::Divide, other)
    }

    /// Apply an arithmetic operator.
    ///
    /// Both operands are force-cast to the wider of the two kinds before the
    /// operator runs. Integral overflow wraps.
    pub fn apply_arithmetic(&self, op: BinaryOperator, other: &FieldValue) -> SqlResult<FieldValue> {
        if !op.is_arithmetic() {
            return Err(SqlError::unsupported(op.symbol(), "arithmetic"));
        }
        for operand in [self, other] {
            if !operand.is_numeric() {
                return Err(SqlError::unsupported(op.symbol(), operand.type_name()));
            }
        }
        let kind = FieldKind::result_kind(self.kind(), other.kind())?;
        let left = self.clone().cast_to(kind)?;
        let right = other.clone().cast_to(kind)?;

        match (left, right) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Ok(FieldValue::Integer(match op {
                BinaryOperator::Add => a.wrapping_add(b),
                BinaryOperator::Subtract => a.wrapping_sub(b),
                BinaryOperator::Multiply => a.wrapping_mul(b),
                _ => {
                    if b == 0 {
                        return Err(division_by_zero());
                    }
                    floor_div_i32(a, b)
                }
            })),
            (FieldValue::Long(a), FieldValue::Long(b)) => Ok(FieldValue::Long(match op {
                BinaryOperator::Add => a.wrapping_add(b),
                BinaryOperator::Subtract => a.wrapping_sub(b),
                BinaryOperator::Multiply => a.wrapping_mul(b),
                _ => {
                    if b == 0 {
                        return Err(division_by_zero());
                    }
                    floor_div_i64(a, b)
                }
            })),
            (FieldValue::Float(a), FieldValue::Float(b)) => Ok(FieldValue::Float(match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                _ => a / b,
            })),
            (FieldValue::Double(a), FieldValue::Double(b)) => Ok(FieldValue::Double(match op {
                BinaryOperator::Add => a + b,
                BinaryOperator::Subtract => a - b,
                BinaryOperator::Multiply => a * b,
                _ => a / b,
            })),
            (left, right) => Err(SqlError::type_error(
                kind.to_string(),
                format!("{}/{}", left.type_name(), right.type_name()),
                None,
            )),
        }
    }

    /// Arithmetic negation. Only LONG and DOUBLE are negatable.
    pub fn negate(&self) -> SqlResult<FieldValue> {
        match self {
            FieldValue::Long(l) => Ok(FieldValue::Long(l.wrapping_neg())),
            FieldValue::Double(d) => Ok(FieldValue::Double(-d)),
            other => Err(SqlError::unsupported("NEGATE", other.type_name())),
        }
    }

    /// Element count of a LIST or MAP.
    pub fn size(&self) -> SqlResult<FieldValue> {
        let len = match self {
            FieldValue::List(items) => items.len(),
            FieldValue::Map(map) => map.len(),
            other => return Err(SqlError::unsupported("SIZEOF", other.type_name())),
        };
        i32::try_from(len)
            .map(FieldValue::Integer)
            .map_err(|_| SqlError::execution_error(format!("Size {} exceeds INTEGER", len), None))
    }

    /// Interpret this value as a predicate result. Only BOOLEAN is accepted.
    pub fn as_bool(&self) -> SqlResult<bool> {
        match self {
            FieldValue::Boolean(b) => Ok(*b),
            other => Err(SqlError::type_error(
                "BOOLEAN",
                other.type_name(),
                Some(other.to_string()),
            )),
        }
    }

    /// Numeric value as `f64`, `None` for non-numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(f64::from(*i)),
            FieldValue::Long(l) => Some(*l as f64),
            FieldValue::Float(f) => Some(f64::from(*f)),
            FieldValue::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Append a kind-tagged, process-independent encoding of this value.
    ///
    /// Used to hash group keys and distinct values so that sketches built in
    /// different processes agree on every hash. Numbers are encoded by value,
    /// not by kind: values that compare equal under numeric widening (`5`,
    /// `5L`, `5.0`, `-0.0` and `0`) share one encoding.
    pub fn write_canonical_bytes(&self, out: &mut Vec<u8>) {
        match self {
            FieldValue::Null => out.push(0),
            FieldValue::Boolean(b) => {
                out.push(1);
                out.push(u8::from(*b));
            }
            FieldValue::Integer(i) => write_integral(i64::from(*i), out),
            FieldValue::Long(l) => write_integral(*l, out),
            FieldValue::Float(f) => write_fractional(f64::from(*f), out),
            FieldValue::Double(d) => write_fractional(*d, out),
            FieldValue::String(s) => {
                out.push(6);
                out.extend_from_slice(&(s.len() as u64).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            FieldValue::List(items) => {
                out.push(7);
                out.extend_from_slice(&(items.len() as u64).to_le_bytes());
                for item in items {
                    item.write_canonical_bytes(out);
                }
            }
            FieldValue::Map(map) => {
                out.push(8);
                out.extend_from_slice(&(map.len() as u64).to_le_bytes());
                for (k, v) in map {
                    out.extend_from_slice(&(k.len() as u64).to_le_bytes());
                    out.extend_from_slice(k.as_bytes());
                    v.write_canonical_bytes(out);
                }
            }
        }
    }
}

fn write_integral(value: i64, out: &mut Vec<u8>) {
    out.push(2);
    out.extend_from_slice(&value.to_le_bytes());
}

/// Whole floating values inside the `i64` range encode as integers; the rest
/// keep their bits, with every NaN collapsed to one pattern.
fn write_fractional(value: f64, out: &mut Vec<u8>) {
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;
    if value.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&value) {
        write_integral(value as i64, out);
        return;
    }
    let bits = if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    };
    out.push(5);
    out.extend_from_slice(&bits.to_le_bytes());
}

fn division_by_zero() -> SqlError {
    SqlError::execution_error("Division by zero", None)
}

fn floor_div_i32(a: i32, b: i32) -> i32 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q.wrapping_sub(1)
    } else {
        q
    }
}

fn floor_div_i64(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q.wrapping_sub(1)
    } else {
        q
    }
}

/// A record flowing through the execution core
///
/// Records are mutable key-value containers. The post-aggregation stages
/// write, overwrite and remove fields in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    /// The actual field data for this record
    pub fields: HashMap<String, FieldValue>,
}

impl StreamRecord {
    /// Create a new StreamRecord with the given fields
    pub fn new(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields }
    }

    /// Create a record with no fields
    pub fn empty() -> Self {
        Self::default()
    }

    /// Get a field value by name
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set (or overwrite) a field, returning the previous value
    pub fn set_field(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    /// Remove a field, returning its value if it was present
    pub fn remove_field(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Check whether a field is present (a NULL value counts as present)
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields in this record
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Copy every field of `other` into this record, overwriting on conflict.
    pub fn merge_from(&mut self, other: &StreamRecord) {
        for (name, value) in &other.fields {
            self.fields.insert(name.clone(), value.clone());
        }
    }

    /// Field names in sorted order.
    pub fn sorted_field_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.fields.keys().collect();
        names.sort();
        names
    }
}

impl std::fmt::Display for StreamRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, name) in self.sorted_field_names().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, self.fields[name])?;
        }
        write!(f, "}}")
    }
}

/// Metadata key set when the result came from a sketch in estimation mode.
pub const META_ESTIMATED: &str = "estimated";
/// Metadata key holding the sketch's sampling probability.
pub const META_THETA: &str = "theta";
/// Metadata key holding the number of retained sketch entries.
pub const META_RETAINED: &str = "retained";
/// Metadata key holding the relative standard error of estimates.
pub const META_STANDARD_ERROR: &str = "standard_error";

/// An ordered batch of result records plus metadata about how it was produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clip {
    records: Vec<StreamRecord>,
    metadata: BTreeMap<String, FieldValue>,
}

impl Clip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<StreamRecord>) -> Self {
        Self {
            records,
            metadata: BTreeMap::new(),
        }
    }

    pub fn add(&mut self, record: StreamRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StreamRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut Vec<StreamRecord> {
        &mut self.records
    }

    pub fn into_records(self) -> Vec<StreamRecord> {
        self.records
    }

    /// Keep only the records for which `keep` returns true, preserving order.
    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&StreamRecord) -> bool,
    {
        self.records.retain(keep);
    }

    pub fn truncate(&mut self, len: usize) {
        self.records.truncate(len);
    }

    pub fn metadata(&self) -> &BTreeMap<String, FieldValue> {
        &self.metadata
    }

    pub fn set_metadata(&mut self, key: impl Into<String>, value: FieldValue) {
        self.metadata.insert(key.into(), value);
    }

    /// Replace the records, keeping the metadata.
    pub fn with_records(self, records: Vec<StreamRecord>) -> Self {
        Self {
            records,
            metadata: self.metadata,
        }
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{records: [")?;
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", record)?;
        }
        write!(f, "], meta: {{")?;
        for (i, (k, v)) in self.metadata.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        write!(f, "}}}}")
    }
}
