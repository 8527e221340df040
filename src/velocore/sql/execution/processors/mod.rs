//! Post-aggregation processors.
//!
//! Each processor transforms a finished [`Clip`] as one stage of the
//! [`PostAggregationPipeline`]. Stages always run in the order HAVING,
//! computation, ORDER BY, culling, regardless of how they were declared.

pub mod computation;
pub mod culling;
pub mod having;
pub mod order;
pub mod pipeline;

pub use computation::ComputationProcessor;
pub use culling::CullingProcessor;
pub use having::HavingProcessor;
pub use order::OrderProcessor;
pub use pipeline::PostAggregationPipeline;

use crate::velocore::sql::ast::{Expr, OrderDirection};
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::types::Clip;
use serde::{Deserialize, Serialize};

/// A post-aggregation stage as declared by a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostAggregation {
    /// Keep only records for which the expression is true.
    Having { expression: Expr },
    /// Add or overwrite fields, in declaration order.
    Computation { fields: Vec<ComputedField> },
    /// Stable multi-key sort.
    OrderBy { fields: Vec<SortItem> },
    /// Drop the named fields from every record.
    Culling { fields: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedField {
    pub name: String,
    pub expression: Expr,
}

impl ComputedField {
    pub fn new(name: impl Into<String>, expression: Expr) -> Self {
        Self {
            name: name.into(),
            expression,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortItem {
    pub expression: Expr,
    #[serde(default)]
    pub direction: OrderDirection,
}

impl SortItem {
    pub fn new(expression: Expr, direction: OrderDirection) -> Self {
        Self {
            expression,
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PostAggregationType {
    Having,
    Computation,
    OrderBy,
    Culling,
}

impl PostAggregationType {
    /// Position in the fixed pipeline order; lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            PostAggregationType::Having => 0,
            PostAggregationType::Computation => 1,
            PostAggregationType::OrderBy => 2,
            PostAggregationType::Culling => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PostAggregationType::Having => "HAVING",
            PostAggregationType::Computation => "COMPUTATION",
            PostAggregationType::OrderBy => "ORDER BY",
            PostAggregationType::Culling => "CULLING",
        }
    }
}

impl PostAggregation {
    pub fn post_type(&self) -> PostAggregationType {
        match self {
            PostAggregation::Having { .. } => PostAggregationType::Having,
            PostAggregation::Computation { .. } => PostAggregationType::Computation,
            PostAggregation::OrderBy { .. } => PostAggregationType::OrderBy,
            PostAggregation::Culling { .. } => PostAggregationType::Culling,
        }
    }

    pub fn validate(&self) -> SqlResult<()> {
        match self {
            PostAggregation::Having { .. } => Ok(()),
            PostAggregation::Computation { fields } => validate_computed_fields(fields),
            PostAggregation::OrderBy { fields } => validate_sort_items(fields),
            PostAggregation::Culling { fields } => validate_culled_fields(fields),
        }
    }

    /// Build the processor for this stage.
    pub fn to_processor(&self) -> SqlResult<Box<dyn PostProcessor>> {
        self.validate()?;
        Ok(match self {
            PostAggregation::Having { expression } => {
                Box::new(HavingProcessor::new(expression.clone()))
            }
            PostAggregation::Computation { fields } => {
                Box::new(ComputationProcessor::new(fields.clone())?)
            }
            PostAggregation::OrderBy { fields } => Box::new(OrderProcessor::new(fields.clone())?),
            PostAggregation::Culling { fields } => Box::new(CullingProcessor::new(fields)?),
        })
    }
}

pub(crate) fn validate_computed_fields(fields: &[ComputedField]) -> SqlResult<()> {
    let stage = PostAggregationType::Computation.name();
    if fields.is_empty() {
        return Err(SqlError::configuration_error(format!(
            "{} needs at least one field",
            stage
        )));
    }
    if fields.iter().any(|f| f.name.trim().is_empty()) {
        return Err(SqlError::configuration_error(format!(
            "{} field names cannot be blank",
            stage
        )));
    }
    Ok(())
}

pub(crate) fn validate_sort_items(fields: &[SortItem]) -> SqlResult<()> {
    if fields.is_empty() {
        return Err(SqlError::configuration_error(format!(
            "{} needs at least one sort key",
            PostAggregationType::OrderBy.name()
        )));
    }
    Ok(())
}

pub(crate) fn validate_culled_fields(fields: &[String]) -> SqlResult<()> {
    if fields.is_empty() || fields.iter().any(|f| f.trim().is_empty()) {
        return Err(SqlError::configuration_error(format!(
            "{} needs non-blank field names",
            PostAggregationType::Culling.name()
        )));
    }
    Ok(())
}

/// One post-aggregation stage.
///
/// A processor takes the clip by value and either returns the transformed
/// clip or fails; there is no partially transformed result.
pub trait PostProcessor: Send + Sync {
    fn process(&self, clip: Clip) -> SqlResult<Clip>;

    fn post_type(&self) -> PostAggregationType;
}
