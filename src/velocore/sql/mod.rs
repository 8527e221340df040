// Query execution core for velocore
// Typed expressions, sketch-backed aggregation and post-aggregation processing

pub mod ast;
pub mod error;
pub mod execution;

// Re-export main API
pub use ast::Expr;
pub use error::{SqlError, SqlResult};
pub use execution::{Clip, FieldKind, FieldValue, StreamRecord};

// Version and feature info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FEATURES: &[&str] = &[
    "typed_arithmetic",   // + - * / with INTEGER < LONG < FLOAT < DOUBLE widening
    "forced_cast",        // CAST that fails instead of truncating silently
    "group_by_sketch",    // COUNT, SUM, MIN, MAX, AVG per group over a theta table
    "count_distinct",     // approximate COUNT DISTINCT
    "having_clause",      // Post-aggregation filtering with HAVING
    "computation",        // Post-aggregation computed fields
    "order_by",           // Multi-key ORDER BY with nulls first
    "culling",            // Removal of transient fields
    "table_functions",    // EXPLODE and LATERAL VIEW
];
