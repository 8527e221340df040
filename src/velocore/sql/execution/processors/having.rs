//! HAVING Clause Processor
//!
//! Filters aggregated records by a predicate. A record survives only when the
//! predicate evaluates to TRUE; FALSE, NULL and evaluation errors all drop it.

use super::{PostAggregationType, PostProcessor};
use crate::velocore::sql::ast::Expr;
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::expression::ExpressionEvaluator;
use crate::velocore::sql::execution::types::Clip;

/// Processor for HAVING filtering
pub struct HavingProcessor {
    expression: Expr,
}

impl HavingProcessor {
    pub fn new(expression: Expr) -> Self {
        Self { expression }
    }
}

impl PostProcessor for HavingProcessor {
    fn process(&self, mut clip: Clip) -> SqlResult<Clip> {
        let before = clip.len();
        clip.retain(
            |record| match ExpressionEvaluator::evaluate_expression(&self.expression, record) {
                Ok(keep) => keep,
                Err(e) => {
                    log::trace!("HAVING {} dropped {}: {}", self.expression, record, e);
                    false
                }
            },
        );
        log::debug!("HAVING kept {} of {} records", clip.len(), before);
        Ok(clip)
    }

    fn post_type(&self) -> PostAggregationType {
        PostAggregationType::Having
    }
}
