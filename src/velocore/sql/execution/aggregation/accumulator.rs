//! Per-group metric accumulation.
//!
//! A [`GroupSummary`] holds one running value per distinct accumulator (see
//! [`GroupOperation::accumulators`]). Summaries combine associatively, which is
//! what lets group sketches merge partial results from other processes.

use super::compute::compute_avg;
use super::functions::AggregationOperator;
use super::operation::{GroupOperation, GroupOperationType};
use crate::velocore::config::NullPolicy;
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::expression::FieldLookup;
use crate::velocore::sql::execution::types::{FieldValue, StreamRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub operation: GroupOperation,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupSummary {
    metrics: Vec<Metric>,
}

impl GroupSummary {
    pub fn new(accumulators: &[GroupOperation]) -> Self {
        Self {
            metrics: accumulators
                .iter()
                .map(|operation| Metric {
                    operation: operation.clone(),
                    value: AggregationOperator::initial(operation.op_type()),
                })
                .collect(),
        }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    /// Fold one record into every metric.
    ///
    /// All contributions are computed before any metric changes, so a record
    /// rejected by the null policy or a type error leaves the summary as it was.
    pub fn consume(
        &mut self,
        record: &StreamRecord,
        lookup: &dyn FieldLookup,
        policy: NullPolicy,
    ) -> SqlResult<()> {
        let mut contributions = Vec::with_capacity(self.metrics.len());
        for metric in &self.metrics {
            let operation = &metric.operation;
            let value = match operation.field() {
                None => FieldValue::Null,
                Some(field) => {
                    let value = match lookup.lookup(field, record) {
                        Ok(value) => value,
                        Err(e) if e.is_lookup_error() => FieldValue::Null,
                        Err(e) => return Err(e),
                    };
                    if value.is_null() && policy == NullPolicy::FailFast {
                        log::warn!("Rejecting record with NULL '{}' under FAIL_FAST", field);
                        return Err(SqlError::execution_error(
                            format!("NULL value for field '{}' in {}", field, operation.op_type()),
                            None,
                        ));
                    }
                    value
                }
            };
            contributions.push(AggregationOperator::contribution(operation.op_type(), &value)?);
        }

        for (metric, contribution) in self.metrics.iter_mut().zip(contributions) {
            if let Some(contribution) = contribution {
                metric.value =
                    AggregationOperator::reduce(metric.operation.op_type(), &metric.value, &contribution)?;
            }
        }
        Ok(())
    }

    /// Fold another summary's metrics into this one, matching by operation
    /// identity.
    pub fn combine(&mut self, other: &GroupSummary) -> SqlResult<()> {
        for incoming in &other.metrics {
            match self
                .metrics
                .iter_mut()
                .find(|m| m.operation == incoming.operation)
            {
                Some(metric) => {
                    metric.value = AggregationOperator::reduce(
                        metric.operation.op_type(),
                        &metric.value,
                        &incoming.value,
                    )?;
                }
                None => self.metrics.push(incoming.clone()),
            }
        }
        Ok(())
    }

    /// Running value of an accumulator.
    pub fn value(&self, operation: &GroupOperation) -> Option<&FieldValue> {
        self.metrics
            .iter()
            .find(|m| m.operation == *operation)
            .map(|m| &m.value)
    }

    /// Final value of a requested operation. AVG divides its sum by the
    /// companion COUNT_FIELD.
    pub fn result(&self, operation: &GroupOperation) -> FieldValue {
        let value = self.value(operation).cloned().unwrap_or(FieldValue::Null);
        match (operation.op_type(), operation.field()) {
            (GroupOperationType::Avg, Some(field)) => {
                let count = self
                    .value(&GroupOperation::count_field(field))
                    .cloned()
                    .unwrap_or(FieldValue::Null);
                compute_avg(&value, &count)
            }
            _ => value,
        }
    }

    /// Write every requested operation under its output name. Internal
    /// accumulators are never written.
    pub fn write_results(&self, requested: &[GroupOperation], record: &mut StreamRecord) {
        for operation in requested
            .iter()
            .filter(|op| !op.op_type().is_internal())
        {
            record.set_field(operation.output_name(), self.result(operation));
        }
    }
}
