use super::dual::{DualSketch, DualStructures};
use super::summary::MergeableSummary;
use super::theta::ThetaTable;
use super::{SketchMetadata, hash_value};
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::types::FieldValue;

/// Distinct-count sketch over hashed values.
#[derive(Debug, Clone)]
pub struct CountDistinctSketch {
    sketch: DualSketch<DualStructures<ThetaTable<()>>>,
}

impl CountDistinctSketch {
    pub fn new(entries: usize) -> Self {
        Self {
            sketch: DualSketch::new(DualStructures::new(ThetaTable::new(entries))),
        }
    }

    pub fn update(&mut self, value: &FieldValue) -> SqlResult<()> {
        self.update_hash(hash_value(value))
    }

    pub fn update_hash(&mut self, hash: u64) -> SqlResult<()> {
        self.sketch
            .update(|s| s.update_mut().update(hash, ()).map(|_| ()))
    }

    /// Merge a serialized sketch, returning the bytes consumed.
    pub fn union(&mut self, bytes: &[u8]) -> SqlResult<usize> {
        self.sketch.union(|s| s.union_mut().union_bytes(bytes))
    }

    pub fn estimate(&mut self) -> SqlResult<f64> {
        Ok(self.sketch.result()?.estimate())
    }

    pub fn metadata(&mut self) -> SqlResult<SketchMetadata> {
        Ok(SketchMetadata::of(self.sketch.result()?))
    }

    pub fn to_bytes(&mut self) -> SqlResult<Vec<u8>> {
        self.sketch.result()?.to_bytes()
    }

    pub fn reset(&mut self) {
        self.sketch.reset();
    }

    pub fn merge_count(&self) -> u64 {
        self.sketch.merge_count()
    }
}
