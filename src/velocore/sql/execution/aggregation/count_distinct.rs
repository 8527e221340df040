use super::Aggregation;
use super::compute::estimate_to_count;
use crate::velocore::config::EngineConfig;
use crate::velocore::sql::ast::Expr;
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::expression::ExpressionEvaluator;
use crate::velocore::sql::execution::sketch::{CountDistinctSketch, hash_values};
use crate::velocore::sql::execution::types::{Clip, FieldValue, StreamRecord};

pub const DEFAULT_COUNT_DISTINCT_NAME: &str = "COUNT DISTINCT";

/// Approximate COUNT DISTINCT over the tuple of one or more expressions.
pub struct CountDistinctAggregation {
    fields: Vec<Expr>,
    name: String,
    sketch: CountDistinctSketch,
}

impl CountDistinctAggregation {
    pub fn new(fields: Vec<Expr>, name: Option<String>, config: &EngineConfig) -> SqlResult<Self> {
        if fields.is_empty() {
            return Err(SqlError::configuration_error(
                "COUNT DISTINCT needs at least one field",
            ));
        }
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_COUNT_DISTINCT_NAME.to_string());
        Ok(Self {
            fields,
            name,
            sketch: CountDistinctSketch::new(config.count_distinct_entries),
        })
    }

    pub fn merge_count(&self) -> u64 {
        self.sketch.merge_count()
    }
}

impl Aggregation for CountDistinctAggregation {
    fn consume(&mut self, record: &StreamRecord) -> SqlResult<()> {
        let values: Vec<FieldValue> = self
            .fields
            .iter()
            .map(|expr| {
                ExpressionEvaluator::evaluate_expression_value(expr, record)
                    .unwrap_or(FieldValue::Null)
            })
            .collect();
        self.sketch.update_hash(hash_values(&values))
    }

    fn combine(&mut self, data: &[u8]) -> SqlResult<()> {
        self.sketch.union(data).map(|_| ())
    }

    fn data(&mut self) -> SqlResult<Vec<u8>> {
        self.sketch.to_bytes()
    }

    fn result(&mut self) -> SqlResult<Clip> {
        let estimate = self.sketch.estimate()?;
        let mut record = StreamRecord::empty();
        record.set_field(self.name.clone(), estimate_to_count(estimate));
        let mut clip = Clip::from_records(vec![record]);
        self.sketch.metadata()?.apply_to(&mut clip);
        Ok(clip)
    }

    fn reset(&mut self) {
        self.sketch.reset();
    }
}
