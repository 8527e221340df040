use super::{PostAggregationType, PostProcessor, validate_culled_fields};
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::types::Clip;
use rustc_hash::FxHashSet;

/// Removes fields from every record. Absent fields are ignored.
pub struct CullingProcessor {
    fields: FxHashSet<String>,
}

impl CullingProcessor {
    pub fn new(fields: &[String]) -> SqlResult<Self> {
        validate_culled_fields(fields)?;
        Ok(Self {
            fields: fields.iter().cloned().collect(),
        })
    }
}

impl PostProcessor for CullingProcessor {
    fn process(&self, mut clip: Clip) -> SqlResult<Clip> {
        for record in clip.records_mut() {
            record.fields.retain(|name, _| !self.fields.contains(name));
        }
        Ok(clip)
    }

    fn post_type(&self) -> PostAggregationType {
        PostAggregationType::Culling
    }
}
