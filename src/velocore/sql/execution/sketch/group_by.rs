use super::dual::{DualSketch, DualStructures};
use super::summary::{Combine, MergeableSummary};
use super::theta::ThetaTable;
use super::{SketchMetadata, hash_values};
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::aggregation::GroupSummary;
use crate::velocore::sql::execution::types::FieldValue;
use serde::{Deserialize, Serialize};

/// One group: its key values and the metrics accumulated for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupEntry {
    pub key: Vec<FieldValue>,
    pub summary: GroupSummary,
}

impl Combine for GroupEntry {
    fn combine(&mut self, other: &Self) -> SqlResult<()> {
        self.summary.combine(&other.summary)
    }
}

/// Per-group summaries, sampled by group-key hash once the number of groups
/// exceeds the configured capacity.
#[derive(Debug, Clone)]
pub struct GroupBySketch {
    capacity: usize,
    sketch: DualSketch<DualStructures<ThetaTable<GroupEntry>>>,
}

impl GroupBySketch {
    pub fn new(entries: usize) -> Self {
        Self {
            capacity: entries,
            sketch: DualSketch::new(DualStructures::new(ThetaTable::new(entries))),
        }
    }

    /// Maximum number of groups retained before sampling starts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Fold a single-record group entry into its group.
    pub fn update(&mut self, entry: GroupEntry) -> SqlResult<()> {
        let hash = hash_values(&entry.key);
        self.sketch
            .update(|s| s.update_mut().update(hash, entry).map(|_| ()))
    }

    pub fn union(&mut self, bytes: &[u8]) -> SqlResult<usize> {
        self.sketch.union(|s| s.union_mut().union_bytes(bytes))
    }

    /// Retained groups, ordered by key hash.
    pub fn groups(&mut self) -> SqlResult<Vec<GroupEntry>> {
        Ok(self.sketch.result()?.values().cloned().collect())
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
