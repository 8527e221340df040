use super::{TableFunctor, validate_explode_aliases};
use crate::velocore::sql::ast::Expr;
use crate::velocore::sql::error::SqlResult;
use crate::velocore::sql::execution::expression::ExpressionEvaluator;
use crate::velocore::sql::execution::types::{FieldValue, StreamRecord};
use std::iter;

/// EXPLODE over a LIST or MAP valued expression.
///
/// Output rows hold only the alias fields. A list element lands in
/// `key_alias`; a map entry puts its key in `key_alias` and its value in
/// `value_alias` (when one is set). Anything else, including NULL, a missing
/// field or an empty container, produces no rows, or a single empty row when
/// `outer` is set.
pub struct ExplodeFunctor {
    field: Expr,
    key_alias: String,
    value_alias: Option<String>,
    outer: bool,
}

impl ExplodeFunctor {
    pub fn new(
        field: Expr,
        key_alias: String,
        value_alias: Option<String>,
        outer: bool,
    ) -> SqlResult<Self> {
        validate_explode_aliases(&key_alias, value_alias.as_deref())?;
        Ok(Self {
            field,
            key_alias,
            value_alias,
            outer,
        })
    }

    fn empty_result<'a>(&self) -> Box<dyn Iterator<Item = StreamRecord> + 'a> {
        if self.outer {
            Box::new(iter::once(StreamRecord::empty()))
        } else {
            Box::new(iter::empty())
        }
    }
}

impl TableFunctor for ExplodeFunctor {
    fn apply<'a>(&'a self, record: &'a StreamRecord) -> Box<dyn Iterator<Item = StreamRecord> + 'a> {
        let value = ExpressionEvaluator::evaluate_expression_value(&self.field, record)
            .unwrap_or_else(|e| {
                log::trace!("EXPLODE {} treated as empty: {}", self.field, e);
                FieldValue::Null
            });
        match value {
            FieldValue::List(items) if !items.is_empty() => {
                Box::new(items.into_iter().map(move |item| {
                    let mut row = StreamRecord::empty();
                    row.set_field(self.key_alias.clone(), item);
                    row
                }))
            }
            FieldValue::Map(entries) if !entries.is_empty() => {
                Box::new(entries.into_iter().map(move |(key, value)| {
                    let mut row = StreamRecord::empty();
                    row.set_field(self.key_alias.clone(), FieldValue::String(key));
                    if let Some(alias) = &self.value_alias {
                        row.set_field(alias.clone(), value);
                    }
                    row
                }))
            }
            _ => self.empty_result(),
        }
    }
}
