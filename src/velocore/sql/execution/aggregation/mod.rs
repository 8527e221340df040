//! Aggregation engine for the execution core.
//!
//! This module handles GROUP BY and COUNT DISTINCT over streams of records.
//! It provides:
//!
//! - Group operation definitions (COUNT, SUM, MIN, MAX, AVG)
//! - Per-group metric accumulation that merges across processes
//! - Sketch-backed aggregation strategies
//!
//! ## Public API
//!
//! - [`Aggregation`] - the consume / combine / result lifecycle
//! - [`GroupByAggregation`] - GROUP BY with group operations
//! - [`CountDistinctAggregation`] - approximate distinct count
//! - [`GroupSummary`] - the mergeable per-group state

pub mod accumulator;
pub mod compute;
pub mod count_distinct;
pub mod functions;
pub mod group_by;
pub mod operation;

pub use accumulator::{GroupSummary, Metric};
pub use count_distinct::CountDistinctAggregation;
pub use functions::AggregationOperator;
pub use group_by::GroupByAggregation;
pub use operation::{GroupOperation, GroupOperationType};

use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::types::{Clip, StreamRecord};

/// An aggregation over a stream of records.
///
/// Partial aggregations built in different processes meet through
/// [`data`](Aggregation::data) and [`combine`](Aggregation::combine).
pub trait Aggregation: Send {
    /// Fold one record in.
    fn consume(&mut self, record: &StreamRecord) -> SqlResult<()>;

    /// Merge serialized state produced by [`data`](Aggregation::data).
    fn combine(&mut self, data: &[u8]) -> SqlResult<()>;

    /// Serialized state.
    fn data(&mut self) -> SqlResult<Vec<u8>>;

    /// Current result records with sketch metadata.
    fn result(&mut self) -> SqlResult<Clip>;

    fn reset(&mut self);
}
