//! Approximate, mergeable sketches.
//!
//! - [`ThetaTable`] - a bounded hash-keyed table that switches to sampling
//!   once full
//! - [`DualSketch`] - the lazy-merge driver over update and union structures
//! - [`CountDistinctSketch`] and [`GroupBySketch`] - the concrete sketches used
//!   by aggregations

pub mod count_distinct;
pub mod dual;
pub mod group_by;
pub mod summary;
pub mod theta;

pub use count_distinct::CountDistinctSketch;
pub use dual::{DualSketch, DualSketchMerge, DualStructures};
pub use group_by::{GroupBySketch, GroupEntry};
pub use summary::{Combine, MergeableSummary};
pub use theta::ThetaTable;

use crate::velocore::sql::execution::types::{
    Clip, FieldValue, META_ESTIMATED, META_RETAINED, META_STANDARD_ERROR, META_THETA,
};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Seed shared by every process so hashes agree across sketch unions.
const HASH_SEED: u64 = 0x5eed_cafe_f00d_d00d;

/// Hash a single value.
pub fn hash_value(value: &FieldValue) -> u64 {
    let mut buf = Vec::with_capacity(16);
    value.write_canonical_bytes(&mut buf);
    xxh3_64_with_seed(&buf, HASH_SEED)
}

/// Hash a tuple of values (a group key or a multi-field distinct key).
pub fn hash_values(values: &[FieldValue]) -> u64 {
    let mut buf = Vec::with_capacity(16 * values.len());
    buf.extend_from_slice(&(values.len() as u64).to_le_bytes());
    for value in values {
        value.write_canonical_bytes(&mut buf);
    }
    xxh3_64_with_seed(&buf, HASH_SEED)
}

/// Accuracy information about a sketch result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SketchMetadata {
    pub estimated: bool,
    pub theta: f64,
    pub retained: usize,
    pub standard_error: f64,
}

impl SketchMetadata {
    pub fn of<V>(table: &ThetaTable<V>) -> Self {
        Self {
            estimated: table.is_estimation_mode(),
            theta: table.theta(),
            retained: table.retained(),
            standard_error: table.standard_error(),
        }
    }

    /// Record this metadata on a result clip.
    pub fn apply_to(&self, clip: &mut Clip) {
        clip.set_metadata(META_ESTIMATED, FieldValue::Boolean(self.estimated));
        clip.set_metadata(META_THETA, FieldValue::Double(self.theta));
        clip.set_metadata(
            META_RETAINED,
            FieldValue::Long(i64::try_from(self.retained).unwrap_or(i64::MAX)),
        );
        clip.set_metadata(META_STANDARD_ERROR, FieldValue::Double(self.standard_error));
    }
}
