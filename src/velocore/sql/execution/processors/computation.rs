use super::{ComputedField, PostAggregationType, PostProcessor, validate_computed_fields};
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::expression::ExpressionEvaluator;
use crate::velocore::sql::execution::types::{Clip, StreamRecord};

/// Adds computed fields to every record.
///
/// Fields are evaluated in declaration order against the record as updated so
/// far, so a later field can read an earlier one. Any evaluation error fails
/// the whole stage.
pub struct ComputationProcessor {
    fields: Vec<ComputedField>,
}

impl ComputationProcessor {
    pub fn new(fields: Vec<ComputedField>) -> SqlResult<Self> {
        validate_computed_fields(&fields)?;
        Ok(Self { fields })
    }

    fn compute(&self, mut record: StreamRecord) -> SqlResult<StreamRecord> {
        for field in &self.fields {
            let value = ExpressionEvaluator::evaluate_expression_value(&field.expression, &record)?;
            record.set_field(field.name.clone(), value);
        }
        Ok(record)
    }
}

impl PostProcessor for ComputationProcessor {
    fn process(&self, clip: Clip) -> SqlResult<Clip> {
        let records = clip
            .records()
            .iter()
            .cloned()
            .map(|record| self.compute(record))
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(clip.with_records(records))
    }

    fn post_type(&self) -> PostAggregationType {
        PostAggregationType::Computation
    }
}
