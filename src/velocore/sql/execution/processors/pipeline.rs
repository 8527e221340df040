use super::{PostAggregation, PostAggregationType, PostProcessor};
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::types::Clip;

/// Ordered chain of post-aggregation processors.
pub struct PostAggregationPipeline {
    processors: Vec<Box<dyn PostProcessor>>,
}

impl PostAggregationPipeline {
    /// Validate and order the declared stages. Stages of the same type keep
    /// their declared relative order.
    pub fn new(post_aggregations: &[PostAggregation]) -> SqlResult<Self> {
        let mut declared: Vec<&PostAggregation> = post_aggregations.iter().collect();
        declared.sort_by_key(|p| p.post_type().priority());
        let processors = declared
            .into_iter()
            .map(PostAggregation::to_processor)
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(Self { processors })
    }

    pub fn empty() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Stage types in execution order.
    pub fn stages(&self) -> Vec<PostAggregationType> {
        self.processors.iter().map(|p| p.post_type()).collect()
    }

    /// Run every stage in order. The first failing stage aborts the run.
    pub fn process(&self, clip: Clip) -> SqlResult<Clip> {
        self.processors.iter().try_fold(clip, |clip, processor| {
            log::trace!("Running {} over {} records", processor.post_type().name(), clip.len());
            processor.process(clip)
        })
    }
}
