use super::Aggregation;
use super::accumulator::GroupSummary;
use super::operation::GroupOperation;
use crate::velocore::config::{EngineConfig, NullPolicy};
use crate::velocore::sql::ast::Expr;
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::expression::{ExpressionEvaluator, FieldLookup, RecordLookup};
use crate::velocore::sql::execution::sketch::{GroupBySketch, GroupEntry};
use crate::velocore::sql::execution::types::{Clip, FieldValue, StreamRecord};
use rustc_hash::FxHashSet;

/// GROUP BY over a set of key expressions, computing group operations per
/// distinct key.
///
/// With no key expressions every record falls into a single group.
pub struct GroupByAggregation {
    fields: Vec<(String, Expr)>,
    operations: Vec<GroupOperation>,
    accumulators: Vec<GroupOperation>,
    null_policy: NullPolicy,
    lookup: Box<dyn FieldLookup + Send>,
    sketch: GroupBySketch,
}

impl GroupByAggregation {
    /// `fields` pairs each output column name with its key expression.
    pub fn new(
        fields: Vec<(String, Expr)>,
        operations: Vec<GroupOperation>,
        config: &EngineConfig,
    ) -> SqlResult<Self> {
        if fields.is_empty() && operations.is_empty() {
            return Err(SqlError::configuration_error(
                "GROUP BY needs at least one key or operation",
            ));
        }
        let mut names = FxHashSet::default();
        let output_names = fields
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(operations.iter().map(|op| op.output_name()));
        for name in output_names {
            if name.trim().is_empty() {
                return Err(SqlError::configuration_error("GROUP BY output names cannot be blank"));
            }
            if !names.insert(name) {
                return Err(SqlError::configuration_error(format!(
                    "Duplicate GROUP BY output name '{}'",
                    name
                )));
            }
        }

        let accumulators = GroupOperation::accumulators(&operations);
        log::debug!(
            "GROUP BY on {} key(s) with {} accumulator(s), capacity {}",
            fields.len(),
            accumulators.len(),
            config.group_entries
        );
        Ok(Self {
            fields,
            operations,
            accumulators,
            null_policy: config.null_policy,
            lookup: Box::new(RecordLookup),
            sketch: GroupBySketch::new(config.group_entries),
        })
    }

    /// Resolve fields through `lookup` instead of plain record lookup.
    pub fn with_lookup(mut self, lookup: Box<dyn FieldLookup + Send>) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn merge_count(&self) -> u64 {
        self.sketch.merge_count()
    }

    fn group_key(&self, record: &StreamRecord) -> Vec<FieldValue> {
        self.fields
            .iter()
            .map(|(name, expr)| {
                ExpressionEvaluator::evaluate_with_lookup(expr, record, self.lookup.as_ref())
                    .unwrap_or_else(|e| {
                        log::trace!("GROUP BY key '{}' evaluated to NULL: {}", name, e);
                        FieldValue::Null
                    })
            })
            .collect()
    }
}

impl Aggregation for GroupByAggregation {
    fn consume(&mut self, record: &StreamRecord) -> SqlResult<()> {
        let key = self.group_key(record);
        let mut summary = GroupSummary::new(&self.accumulators);
        summary.consume(record, self.lookup.as_ref(), self.null_policy)?;
        self.sketch.update(GroupEntry { key, summary })
    }

    fn combine(&mut self, data: &[u8]) -> SqlResult<()> {
        self.sketch.union(data).map(|_| ())
    }

    fn data(&mut self) -> SqlResult<Vec<u8>> {
        self.sketch.to_bytes()
    }

    fn result(&mut self) -> SqlResult<Clip> {
        let metadata = self.sketch.metadata()?;
        if metadata.estimated {
            log::warn!(
                "GROUP BY exceeded {} groups; result is a sample of {} groups",
                self.sketch.capacity(),
                metadata.retained
            );
        }
        let mut clip = Clip::new();
        for group in self.sketch.groups()? {
            let mut record = StreamRecord::empty();
            for ((name, _), value) in self.fields.iter().zip(group.key) {
                record.set_field(name.clone(), value);
            }
            group.summary.write_results(&self.operations, &mut record);
            clip.add(record);
        }
        metadata.apply_to(&mut clip);
        Ok(clip)
    }

    fn reset(&mut self) {
        self.sketch.reset();
    }
}
