//! ORDER BY Sorting Processor
//!
//! Implements a stable multi-key sort of result records. Sort keys are
//! evaluated once per record; a key that fails to evaluate sorts as NULL.
//! NULLs sort first in both directions, and values that cannot be compared
//! with each other are treated as equal.

use super::{PostAggregationType, PostProcessor, SortItem, validate_sort_items};
use crate::velocore::sql::ast::OrderDirection;
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::expression::ExpressionEvaluator;
use crate::velocore::sql::execution::types::{Clip, FieldValue, StreamRecord};
use crate::velocore::sql::execution::utils::{FieldValueComparator, NullOrdering};
use std::cmp::Ordering;

/// Processor for ORDER BY sorting operations
pub struct OrderProcessor {
    order_by: Vec<SortItem>,
}

impl OrderProcessor {
    pub fn new(order_by: Vec<SortItem>) -> SqlResult<Self> {
        validate_sort_items(&order_by)?;
        Ok(Self { order_by })
    }

    fn sort_keys(&self, record: &StreamRecord) -> Vec<FieldValue> {
        self.order_by
            .iter()
            .map(|item| {
                ExpressionEvaluator::evaluate_expression_value(&item.expression, record)
                    .unwrap_or(FieldValue::Null)
            })
            .collect()
    }

    /// Compare two records' precomputed keys in order of priority
    fn compare_keys(&self, left: &[FieldValue], right: &[FieldValue]) -> Ordering {
        for (item, (l, r)) in self.order_by.iter().zip(left.iter().zip(right.iter())) {
            let comparison = match (l.is_null(), r.is_null()) {
                (false, false) => {
                    let ordering = FieldValueComparator::compare(l, r).unwrap_or(Ordering::Equal);
                    match item.direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    }
                }
                _ => FieldValueComparator::compare_with_nulls(l, r, NullOrdering::NullsFirst)
                    .unwrap_or(Ordering::Equal),
            };
            // If equal, continue to next ORDER BY key
            if comparison != Ordering::Equal {
                return comparison;
            }
        }
        Ordering::Equal
    }
}

impl PostProcessor for OrderProcessor {
    fn process(&self, clip: Clip) -> SqlResult<Clip> {
        let keyed: Vec<(Vec<FieldValue>, StreamRecord)> = clip
            .records()
            .iter()
            .map(|record| (self.sort_keys(record), record.clone()))
            .collect();
        let keyed = merge_sort(keyed, &|(a, _), (b, _)| self.compare_keys(a, b));
        let records = keyed.into_iter().map(|(_, record)| record).collect();
        Ok(clip.with_records(records))
    }

    fn post_type(&self) -> PostAggregationType {
        PostAggregationType::OrderBy
    }
}

/// Stable top-down merge sort.
///
/// Incomparable keys compare as equal, which is not a total order, so this
/// avoids `slice::sort_by` and its right to panic on inconsistent comparators.
fn merge_sort<T>(mut items: Vec<T>, compare: &dyn Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let mut left = merge_sort(items, compare).into_iter().peekable();
    let mut right = merge_sort(right, compare).into_iter().peekable();
    let mut out = Vec::with_capacity(left.len() + right.len());
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            (None, Some(_)) => true,
            (_, None) => false,
        };
        let next = if take_right { right.next() } else { left.next() };
        match next {
            Some(item) => out.push(item),
            None => break,
        }
    }
    out
}
