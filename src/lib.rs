//! # velocore
//!
//! The execution core of a streaming query engine. It evaluates typed scalar
//! expressions against individual records, folds groups of records into
//! mergeable approximate summaries, and runs a fixed-order pipeline of
//! post-aggregation transforms over the finished result batch.
//!
//! ## Features
//!
//! - **Typed Values**: `FieldValue` with an INTEGER < LONG < FLOAT < DOUBLE widening algebra and forced casts
//! - **Expression Evaluation**: arithmetic, casts, field access, `SIZEOF` and typed literals
//! - **Sketch Aggregation**: GROUP BY and COUNT DISTINCT over lazily merged dual-structure sketches
//! - **Post-Aggregation**: HAVING, computed fields, ORDER BY and field culling in a fixed order
//! - **Table Functions**: EXPLODE and LATERAL VIEW row expansion
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use velocore::velocore::config::EngineConfig;
//! use velocore::velocore::sql::ast::Expr;
//! use velocore::velocore::sql::execution::aggregation::{
//!     GroupByAggregation, GroupOperation, GroupOperationType,
//! };
//! use velocore::velocore::sql::execution::engine::AggregationQuery;
//! use velocore::velocore::sql::execution::types::{FieldValue, StreamRecord};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let aggregation = GroupByAggregation::new(
//!         vec![("symbol".to_string(), Expr::column("symbol"))],
//!         vec![GroupOperation::new(
//!             GroupOperationType::Sum,
//!             Some("price".to_string()),
//!             Some("total".to_string()),
//!         )?],
//!         &config,
//!     )?;
//!     let mut query = AggregationQuery::new(Box::new(aggregation), vec![], vec![], config)?;
//!
//!     let mut fields = HashMap::new();
//!     fields.insert("symbol".to_string(), FieldValue::String("AAPL".to_string()));
//!     fields.insert("price".to_string(), FieldValue::Long(10));
//!     query.consume(&StreamRecord::new(fields))?;
//!
//!     let clip = query.finish()?;
//!     println!("{}", clip);
//!     Ok(())
//! }
//! ```

// Allow certain clippy warnings for development
#![allow(clippy::collapsible_if)]
#![allow(clippy::large_enum_variant)]

pub mod velocore;

// Re-export the most used types at crate root
pub use velocore::config::{EngineConfig, NullPolicy};
pub use velocore::sql::error::{SqlError, SqlResult};
pub use velocore::sql::execution::types::{Clip, FieldKind, FieldValue, StreamRecord};
