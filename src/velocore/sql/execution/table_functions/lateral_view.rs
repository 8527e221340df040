use super::{TableFunctor, nested_lateral_view};
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::types::StreamRecord;
use std::iter;

/// LATERAL VIEW: each row from the inner functor is merged onto a copy of
/// the input record, with generated fields overwriting on name clashes.
/// When the inner functor yields nothing, an outer view keeps the input
/// record unchanged.
pub struct LateralViewFunctor {
    inner: Box<dyn TableFunctor>,
    outer: bool,
}

impl LateralViewFunctor {
    pub fn new(inner: Box<dyn TableFunctor>, outer: bool) -> SqlResult<Self> {
        if inner.is_lateral_view() {
            return Err(nested_lateral_view());
        }
        Ok(Self { inner, outer })
    }
}

impl TableFunctor for LateralViewFunctor {
    fn apply<'a>(&'a self, record: &'a StreamRecord) -> Box<dyn Iterator<Item = StreamRecord> + 'a> {
        let mut generated = self.inner.apply(record).peekable();
        if generated.peek().is_none() {
            return if self.outer {
                Box::new(iter::once(record.clone()))
            } else {
                Box::new(iter::empty())
            };
        }
        Box::new(generated.map(move |row| {
            let mut joined = record.clone();
            joined.merge_from(&row);
            joined
        }))
    }

    fn is_lateral_view(&self) -> bool {
        true
    }
}
