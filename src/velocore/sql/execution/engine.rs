//! Aggregation query driver.
//!
//! An [`AggregationQuery`] owns one aggregation plus everything that runs
//! after it. Finishing a query produces the result clip:
//!
//! ```text
//! aggregation.result() -> post-aggregation pipeline -> table functions -> cap
//! ```

use super::aggregation::Aggregation;
use super::processors::{PostAggregation, PostAggregationPipeline};
use super::table_functions::{self, TableFunction, TableFunctor};
use super::types::{Clip, StreamRecord};
use crate::velocore::config::EngineConfig;
use crate::velocore::sql::error::SqlResult;

pub struct AggregationQuery {
    aggregation: Box<dyn Aggregation>,
    pipeline: PostAggregationPipeline,
    table_functors: Vec<Box<dyn TableFunctor>>,
    config: EngineConfig,
    consumed: u64,
}

impl AggregationQuery {
    pub fn new(
        aggregation: Box<dyn Aggregation>,
        post_aggregations: Vec<PostAggregation>,
        table_functions: Vec<TableFunction>,
        config: EngineConfig,
    ) -> SqlResult<Self> {
        config.validate()?;
        let pipeline = PostAggregationPipeline::new(&post_aggregations)?;
        let table_functors = table_functions
            .iter()
            .map(TableFunction::to_functor)
            .collect::<SqlResult<Vec<_>>>()?;
        log::debug!(
            "Built aggregation query: {} post-aggregation stage(s), {} table function(s)",
            post_aggregations.len(),
            table_functors.len()
        );
        Ok(Self {
            aggregation,
            pipeline,
            table_functors,
            config,
            consumed: 0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &PostAggregationPipeline {
        &self.pipeline
    }

    /// Records consumed since creation or the last reset.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn consume(&mut self, record: &StreamRecord) -> SqlResult<()> {
        self.aggregation.consume(record)?;
        self.consumed += 1;
        Ok(())
    }

    /// Merge partial state produced by another query's [`data`](Self::data).
    pub fn combine(&mut self, data: &[u8]) -> SqlResult<()> {
        self.aggregation.combine(data)
    }

    pub fn data(&mut self) -> SqlResult<Vec<u8>> {
        self.aggregation.data()
    }

    /// Produce the final result clip.
    pub fn finish(&mut self) -> SqlResult<Clip> {
        let clip = self.pipeline.process(self.aggregation.result()?)?;
        let mut clip = if self.table_functors.is_empty() {
            clip
        } else {
            let records = clip.records().to_vec();
            clip.with_records(table_functions::expand(records, &self.table_functors))
        };
        let limit = self.config.max_result_records;
        if limit > 0 && clip.len() > limit {
            log::debug!("Capping {} result records at {}", clip.len(), limit);
            clip.truncate(limit);
        }
        Ok(clip)
    }

    pub fn reset(&mut self) {
        self.aggregation.reset();
        self.consumed = 0;
    }
}
