//! Expression evaluation module for the execution core.
//!
//! The expression evaluation system supports:
//! - Column references, including dotted paths into maps and lists
//! - Typed literals parsed at evaluation time
//! - Arithmetic with numeric widening, comparison and logical operators
//! - Forced casts and SIZEOF
//! - Pluggable field lookup (plain or schema-checked)

pub mod evaluator;
pub mod lookup;

// Re-export the main API
pub use evaluator::ExpressionEvaluator;
pub use lookup::{FieldLookup, RecordLookup, SchemaLookup};
