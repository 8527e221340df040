//! Expression evaluator for typed expressions.
//!
//! This module implements the core expression evaluation logic that walks an
//! [`Expr`] tree against a single record and produces a [`FieldValue`].
//! Evaluation is pure: it never mutates the record and keeps no state across
//! calls. The first error encountered is returned unchanged.

use super::lookup::{FieldLookup, RecordLookup};
use crate::velocore::sql::ast::{BinaryOperator, Expr, UnaryOperator};
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::types::{FieldValue, StreamRecord};
use crate::velocore::sql::execution::utils::FieldValueComparator;
use std::cmp::Ordering;

/// Main expression evaluator that handles all expression node kinds
pub struct ExpressionEvaluator;

impl ExpressionEvaluator {
    /// Evaluates a boolean expression against a record
    ///
    /// Used for HAVING evaluation. NULL counts as false; any kind other than
    /// BOOLEAN or NULL is a type error.
    pub fn evaluate_expression(expr: &Expr, record: &StreamRecord) -> SqlResult<bool> {
        match Self::evaluate_expression_value(expr, record)? {
            FieldValue::Null => Ok(false),
            value => value.as_bool(),
        }
    }

    /// Evaluates an expression and returns its value, resolving fields with
    /// [`RecordLookup`].
    pub fn evaluate_expression_value(expr: &Expr, record: &StreamRecord) -> SqlResult<FieldValue> {
        Self::evaluate_with_lookup(expr, record, &RecordLookup)
    }

    /// Evaluates an expression, resolving fields through `lookup`.
    pub fn evaluate_with_lookup(
        expr: &Expr,
        record: &StreamRecord,
        lookup: &dyn FieldLookup,
    ) -> SqlResult<FieldValue> {
        match expr {
            Expr::Column(name) => lookup.lookup(name, record),
            Expr::Literal { value, kind } => FieldValue::parse_literal(value, *kind),
            Expr::Nested(inner) => Self::evaluate_with_lookup(inner, record, lookup),
            Expr::Cast { expr, kind } => {
                Self::evaluate_with_lookup(expr, record, lookup)?.cast_to(*kind)
            }
            Expr::SizeOf(field) => lookup.lookup(field, record)?.size(),
            Expr::UnaryOp { op, expr } => Self::evaluate_unary(*op, expr, record, lookup),
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And | BinaryOperator::Or => {
                    Self::evaluate_logical(*op, left, right, record, lookup)
                }
                _ => {
                    let left_val = Self::evaluate_with_lookup(left, record, lookup)?;
                    let right_val = Self::evaluate_with_lookup(right, record, lookup)?;
                    if op.is_arithmetic() {
                        left_val.apply_arithmetic(*op, &right_val)
                    } else {
                        Self::evaluate_comparison(*op, &left_val, &right_val)
                    }
                }
            },
        }
    }

    fn evaluate_unary(
        op: UnaryOperator,
        expr: &Expr,
        record: &StreamRecord,
        lookup: &dyn FieldLookup,
    ) -> SqlResult<FieldValue> {
        match op {
            UnaryOperator::Minus => Self::evaluate_with_lookup(expr, record, lookup)?.negate(),
            UnaryOperator::Not => {
                let value = Self::evaluate_with_lookup(expr, record, lookup)?;
                Ok(match Self::to_tristate(&value)? {
                    Some(b) => FieldValue::Boolean(!b),
                    None => FieldValue::Null,
                })
            }
            UnaryOperator::IsNull | UnaryOperator::IsNotNull => {
                // An absent field reads as NULL here rather than failing.
                let is_null = match Self::evaluate_with_lookup(expr, record, lookup) {
                    Ok(value) => value.is_null(),
                    Err(e) if e.is_lookup_error() => true,
                    Err(e) => return Err(e),
                };
                Ok(FieldValue::Boolean(if op == UnaryOperator::IsNull {
                    is_null
                } else {
                    !is_null
                }))
            }
        }
    }

    /// AND / OR with three-valued logic and left-to-right short circuit.
    fn evaluate_logical(
        op: BinaryOperator,
        left: &Expr,
        right: &Expr,
        record: &StreamRecord,
        lookup: &dyn FieldLookup,
    ) -> SqlResult<FieldValue> {
        let left_val = Self::to_tristate(&Self::evaluate_with_lookup(left, record, lookup)?)?;
        let short_circuit = match op {
            BinaryOperator::And => Some(false),
            _ => Some(true),
        };
        if left_val == short_circuit {
            return Ok(FieldValue::Boolean(left_val == Some(true)));
        }
        let right_val = Self::to_tristate(&Self::evaluate_with_lookup(right, record, lookup)?)?;
        let result = match (op, left_val, right_val) {
            (BinaryOperator::And, _, Some(false)) => Some(false),
            (BinaryOperator::And, Some(true), Some(true)) => Some(true),
            (BinaryOperator::Or, _, Some(true)) => Some(true),
            (BinaryOperator::Or, Some(false), Some(false)) => Some(false),
            _ => None,
        };
        Ok(result.map_or(FieldValue::Null, FieldValue::Boolean))
    }

    fn evaluate_comparison(
        op: BinaryOperator,
        left: &FieldValue,
        right: &FieldValue,
    ) -> SqlResult<FieldValue> {
        if left.is_null() || right.is_null() {
            return Ok(FieldValue::Null);
        }
        let result = match op {
            BinaryOperator::Equal => FieldValueComparator::values_equal(left, right),
            BinaryOperator::NotEqual => !FieldValueComparator::values_equal(left, right),
            _ => {
                let ordering = FieldValueComparator::compare(left, right)?;
                match op {
                    BinaryOperator::LessThan => ordering == Ordering::Less,
                    BinaryOperator::LessThanOrEqual => ordering != Ordering::Greater,
                    BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                    BinaryOperator::GreaterThanOrEqual => ordering != Ordering::Less,
                    _ => return Err(SqlError::unsupported(op.symbol(), left.type_name())),
                }
            }
        };
        Ok(FieldValue::Boolean(result))
    }

    fn to_tristate(value: &FieldValue) -> SqlResult<Option<bool>> {
        match value {
            FieldValue::Null => Ok(None),
            other => other.as_bool().map(Some),
        }
    }
}
