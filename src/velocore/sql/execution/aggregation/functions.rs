//! Aggregate function reductions.
//!
//! An [`AggregationOperator`] turns one field value into a contribution and
//! folds contributions into a running value. NULL running values mean "no
//! contribution yet" and act as the identity for every operation.

use super::compute::widen_for_sum;
use super::operation::GroupOperationType;
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::types::FieldValue;
use crate::velocore::sql::execution::utils::FieldValueComparator;
use std::cmp::Ordering;

/// Reduction table for group operations
pub struct AggregationOperator;

impl AggregationOperator {
    /// Initial running value for an operation.
    pub fn initial(op_type: GroupOperationType) -> FieldValue {
        match op_type {
            GroupOperationType::Count | GroupOperationType::CountField => FieldValue::Long(0),
            _ => FieldValue::Null,
        }
    }

    /// What a single field value adds to the running value, `None` when it
    /// adds nothing. COUNT ignores the value entirely.
    pub fn contribution(
        op_type: GroupOperationType,
        value: &FieldValue,
    ) -> SqlResult<Option<FieldValue>> {
        if op_type == GroupOperationType::Count {
            return Ok(Some(FieldValue::Long(1)));
        }
        if value.is_null() {
            return Ok(None);
        }
        match op_type {
            GroupOperationType::CountField => Ok(Some(FieldValue::Long(1))),
            _ if !value.is_numeric() => Err(SqlError::type_error(
                "numeric",
                value.type_name(),
                Some(value.to_string()),
            )),
            GroupOperationType::Sum | GroupOperationType::Avg => Ok(Some(widen_for_sum(value))),
            _ => Ok(Some(value.clone())),
        }
    }

    /// Fold `incoming` into `current`.
    pub fn reduce(
        op_type: GroupOperationType,
        current: &FieldValue,
        incoming: &FieldValue,
    ) -> SqlResult<FieldValue> {
        if incoming.is_null() {
            return Ok(current.clone());
        }
        if current.is_null() {
            return Ok(incoming.clone());
        }
        match op_type {
            GroupOperationType::Count
            | GroupOperationType::CountField
            | GroupOperationType::Sum
            | GroupOperationType::Avg => current.add(incoming),
            GroupOperationType::Min => Ok(
                match FieldValueComparator::compare(incoming, current)? {
                    Ordering::Less => incoming.clone(),
                    _ => current.clone(),
                },
            ),
            GroupOperationType::Max => Ok(
                match FieldValueComparator::compare(incoming, current)? {
                    Ordering::Greater => incoming.clone(),
                    _ => current.clone(),
                },
            ),
        }
    }
}
