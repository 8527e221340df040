//! Table functions: one record in, zero or more records out.
//!
//! [`TableFunction`] is the declared form; [`TableFunction::to_functor`] turns
//! it into a [`TableFunctor`] that does the expansion.

pub mod explode;
pub mod lateral_view;

pub use explode::ExplodeFunctor;
pub use lateral_view::LateralViewFunctor;

use crate::velocore::sql::ast::Expr;
use crate::velocore::sql::error::{SqlError, SqlResult};
use crate::velocore::sql::execution::types::StreamRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFunctionType {
    Explode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "spec", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableFunction {
    /// Expand a LIST into one row per element, or a MAP into one row per
    /// entry. With `outer`, an empty or missing input still yields one row.
    Explode {
        field: Expr,
        key_alias: String,
        #[serde(default)]
        value_alias: Option<String>,
        #[serde(default)]
        outer: bool,
    },
    /// Join each row produced by `inner` back onto the input record.
    LateralView {
        inner: Box<TableFunction>,
        #[serde(default)]
        outer: bool,
    },
}

impl TableFunction {
    pub fn explode(field: Expr, key_alias: impl Into<String>, outer: bool) -> Self {
        TableFunction::Explode {
            field,
            key_alias: key_alias.into(),
            value_alias: None,
            outer,
        }
    }

    pub fn explode_map(
        field: Expr,
        key_alias: impl Into<String>,
        value_alias: impl Into<String>,
        outer: bool,
    ) -> Self {
        TableFunction::Explode {
            field,
            key_alias: key_alias.into(),
            value_alias: Some(value_alias.into()),
            outer,
        }
    }

    pub fn lateral_view(inner: TableFunction, outer: bool) -> Self {
        TableFunction::LateralView {
            inner: Box::new(inner),
            outer,
        }
    }

    pub fn is_lateral_view(&self) -> bool {
        matches!(self, TableFunction::LateralView { .. })
    }

    pub fn is_outer(&self) -> bool {
        match self {
            TableFunction::Explode { outer, .. } | TableFunction::LateralView { outer, .. } => {
                *outer
            }
        }
    }

    /// The underlying generator type; a lateral view reports its inner one.
    pub fn function_type(&self) -> TableFunctionType {
        match self {
            TableFunction::Explode { .. } => TableFunctionType::Explode,
            TableFunction::LateralView { inner, .. } => inner.function_type(),
        }
    }

    pub fn validate(&self) -> SqlResult<()> {
        match self {
            TableFunction::Explode {
                key_alias,
                value_alias,
                ..
            } => validate_explode_aliases(key_alias, value_alias.as_deref()),
            TableFunction::LateralView { inner, .. } if inner.is_lateral_view() => {
                Err(nested_lateral_view())
            }
            TableFunction::LateralView { inner, .. } => inner.validate(),
        }
    }

    pub fn to_functor(&self) -> SqlResult<Box<dyn TableFunctor>> {
        self.validate()?;
        Ok(match self {
            TableFunction::Explode {
                field,
                key_alias,
                value_alias,
                outer,
            } => Box::new(ExplodeFunctor::new(
                field.clone(),
                key_alias.clone(),
                value_alias.clone(),
                *outer,
            )?),
            TableFunction::LateralView { inner, outer } => {
                Box::new(LateralViewFunctor::new(inner.to_functor()?, *outer)?)
            }
        })
    }
}

/// Expands one record into a lazy sequence of records.
pub trait TableFunctor: Send + Sync {
    fn apply<'a>(&'a self, record: &'a StreamRecord) -> Box<dyn Iterator<Item = StreamRecord> + 'a>;

    fn is_lateral_view(&self) -> bool {
        false
    }
}

pub(crate) fn validate_explode_aliases(key_alias: &str, value_alias: Option<&str>) -> SqlResult<()> {
    if key_alias.trim().is_empty() {
        return Err(SqlError::configuration_error("EXPLODE needs a key alias"));
    }
    if value_alias.is_some_and(|v| v.trim().is_empty()) {
        return Err(SqlError::configuration_error(
            "EXPLODE value alias cannot be blank",
        ));
    }
    if value_alias == Some(key_alias) {
        return Err(SqlError::configuration_error(
            "EXPLODE key and value aliases must differ",
        ));
    }
    Ok(())
}

pub(crate) fn nested_lateral_view() -> SqlError {
    SqlError::configuration_error("LATERAL VIEW cannot wrap another LATERAL VIEW")
}

/// Run `records` through each functor in turn.
pub fn expand(records: Vec<StreamRecord>, functors: &[Box<dyn TableFunctor>]) -> Vec<StreamRecord> {
    functors.iter().fold(records, |records, functor| {
        records
            .iter()
            .flat_map(|record| functor.apply(record))
            .collect()
    })
}
