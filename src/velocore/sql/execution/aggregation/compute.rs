//! Shared pure-function computation for aggregate math.

use crate::velocore::sql::execution::types::FieldValue;

/// Widen a numeric value to the 64-bit kind of its family before summing,
/// so SUM over INTEGER accumulates as LONG and SUM over FLOAT as DOUBLE.
pub fn widen_for_sum(value: &FieldValue) -> FieldValue {
    match value {
        FieldValue::Integer(i) => FieldValue::Long(i64::from(*i)),
        FieldValue::Float(f) => FieldValue::Double(f64::from(*f)),
        other => other.clone(),
    }
}

/// AVG from its running sum and non-null count. NULL when nothing was counted.
pub fn compute_avg(sum: &FieldValue, count: &FieldValue) -> FieldValue {
    match (sum.as_f64(), count.as_f64()) {
        (Some(s), Some(c)) if c > 0.0 => FieldValue::Double(s / c),
        _ => FieldValue::Null,
    }
}

/// Round a sketch estimate to a LONG count.
pub fn estimate_to_count(estimate: f64) -> FieldValue {
    if estimate.is_finite() && estimate > 0.0 {
        FieldValue::Long(estimate.round() as i64)
    } else {
        FieldValue::Long(0)
    }
}
