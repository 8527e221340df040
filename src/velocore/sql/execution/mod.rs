//! Query execution core.
//!
//! Records flow through three layers:
//!
//! 1. [`aggregation`] consumes records into mergeable [`sketch`] state, keyed by
//!    group, and hands back a [`Clip`] of result records.
//! 2. [`processors`] run the post-aggregation pipeline over that clip in a
//!    fixed order: HAVING, computation, ORDER BY, culling.
//! 3. [`table_functions`] expand each result record into zero or more rows.
//!
//! [`engine::AggregationQuery`] wires the three together. Scalar work is done
//! by the [`expression`] evaluator over the [`types`] value model.

pub mod aggregation;
pub mod engine;
pub mod expression;
pub mod processors;
pub mod sketch;
pub mod table_functions;
pub mod types;
pub mod utils;

pub use engine::AggregationQuery;
pub use expression::ExpressionEvaluator;
pub use types::{Clip, FieldKind, FieldValue, StreamRecord};
