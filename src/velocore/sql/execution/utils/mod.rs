//! Utility modules for the execution core
//!
//! Pure helper functions that carry no engine state.

pub mod field_value_comparator;

pub use field_value_comparator::{FieldValueComparator, NullOrdering};
