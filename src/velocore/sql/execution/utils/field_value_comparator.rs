//! Field Value Comparison Utilities
//!
//! Handles ordering and equality between FieldValue instances.
//! These are pure comparison functions with no engine state dependency.

use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::types::{FieldKind, FieldValue};
use std::cmp::Ordering;

/// Where NULL values sort relative to non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    #[default]
    NullsFirst,
    NullsLast,
}

/// Utility class for comparing FieldValue instances
pub struct FieldValueComparator;

impl FieldValueComparator {
    /// Compare two values, placing NULLs according to `nulls`.
    pub fn compare_with_nulls(
        left: &FieldValue,
        right: &FieldValue,
        nulls: NullOrdering,
    ) -> SqlResult<Ordering> {
        match (left.is_null(), right.is_null()) {
            (true, true) => Ok(Ordering::Equal),
            (true, false) => Ok(match nulls {
                NullOrdering::NullsFirst => Ordering::Less,
                NullOrdering::NullsLast => Ordering::Greater,
            }),
            (false, true) => Ok(match nulls {
                NullOrdering::NullsFirst => Ordering::Greater,
                NullOrdering::NullsLast => Ordering::Less,
            }),
            (false, false) => Self::compare(left, right),
        }
    }

    /// Compare two non-null values.
    ///
    /// Numeric kinds compare numerically after widening to the wider kind,
    /// strings compare lexicographically and booleans order false < true.
    /// Any other pairing is a type error.
    pub fn compare(left: &FieldValue, right: &FieldValue) -> SqlResult<Ordering> {
        match (left, right) {
            (FieldValue::String(a), FieldValue::String(b)) => Ok(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Ok(a.cmp(b)),
            (l, r) if l.is_numeric() && r.is_numeric() => Self::compare_numeric(l, r),
            _ => Err(SqlError::type_error(
                left.type_name(),
                right.type_name(),
                Some(right.to_string()),
            )),
        }
    }

    fn compare_numeric(left: &FieldValue, right: &FieldValue) -> SqlResult<Ordering> {
        let kind = FieldKind::result_kind(left.kind(), right.kind())?;
        let l = left.clone().cast_to(kind)?;
        let r = right.clone().cast_to(kind)?;
        Ok(match (l, r) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(&b),
            (FieldValue::Long(a), FieldValue::Long(b)) => a.cmp(&b),
            (FieldValue::Float(a), FieldValue::Float(b)) => a.total_cmp(&b),
            (FieldValue::Double(a), FieldValue::Double(b)) => a.total_cmp(&b),
            _ => Ordering::Equal,
        })
    }

    /// Equality with numeric widening, so `INTEGER 5 = DOUBLE 5.0`.
    ///
    /// Values of non-comparable kinds are simply unequal.
    pub fn values_equal(left: &FieldValue, right: &FieldValue) -> bool {
        match (left, right) {
            (FieldValue::Null, FieldValue::Null) => true,
            (FieldValue::List(a), FieldValue::List(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| Self::values_equal(x, y))
            }
            (FieldValue::Map(a), FieldValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|bv| Self::values_equal(v, bv)))
            }
            (l, r) if l.is_null() || r.is_null() => false,
            (l, r) => matches!(Self::compare(l, r), Ok(Ordering::Equal)),
        }
    }
}
