//! Group operation definitions.
//!
//! A [`GroupOperation`] names one metric to compute per group. Two operations
//! are the same metric when their type and field match; the output name is
//! only a label, so `SUM(price) AS a` and `SUM(price) AS b` share one
//! accumulator.

use crate::velocore::sql::error::{SqlError, SqlResult};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroupOperationType {
    Count,
    /// Non-null count of a field. Only ever synthesized as the companion of
    /// an AVG.
    CountField,
    Sum,
    Min,
    Max,
    Avg,
}

impl GroupOperationType {
    pub fn name(&self) -> &'static str {
        match self {
            GroupOperationType::Count => "COUNT",
            GroupOperationType::CountField => "COUNT_FIELD",
            GroupOperationType::Sum => "SUM",
            GroupOperationType::Min => "MIN",
            GroupOperationType::Max => "MAX",
            GroupOperationType::Avg => "AVG",
        }
    }

    pub fn requires_field(&self) -> bool {
        !matches!(self, GroupOperationType::Count)
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, GroupOperationType::CountField)
    }
}

impl fmt::Display for GroupOperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupOperationType {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Ok(GroupOperationType::Count),
            "SUM" => Ok(GroupOperationType::Sum),
            "MIN" => Ok(GroupOperationType::Min),
            "MAX" => Ok(GroupOperationType::Max),
            "AVG" => Ok(GroupOperationType::Avg),
            other => Err(SqlError::configuration_error(format!(
                "Unsupported group operation '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOperation {
    op_type: GroupOperationType,
    field: Option<String>,
    name: Option<String>,
}

impl GroupOperation {
    /// Build a user-facing operation.
    ///
    /// Every operation but COUNT needs a field, and every one needs an output
    /// name. COUNT_FIELD cannot be requested directly.
    pub fn new(
        op_type: GroupOperationType,
        field: Option<String>,
        name: Option<String>,
    ) -> SqlResult<Self> {
        if op_type.is_internal() {
            return Err(SqlError::configuration_error(format!(
                "{} is not a requestable operation",
                op_type
            )));
        }
        let field = match (op_type.requires_field(), non_blank(field)) {
            (true, None) => {
                return Err(SqlError::configuration_error(format!(
                    "{} requires a field",
                    op_type
                )));
            }
            (true, field) => field,
            (false, _) => None,
        };
        let name = non_blank(name).ok_or_else(|| {
            SqlError::configuration_error(format!("{} requires an output name", op_type))
        })?;
        Ok(Self {
            op_type,
            field,
            name: Some(name),
        })
    }

    pub(crate) fn count_field(field: &str) -> Self {
        Self {
            op_type: GroupOperationType::CountField,
            field: Some(field.to_string()),
            name: None,
        }
    }

    pub fn op_type(&self) -> GroupOperationType {
        self.op_type
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Label used for this operation's output column.
    pub fn output_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.op_type.name())
    }

    /// Distinct accumulators needed to answer `requested`: duplicates by
    /// identity collapse, and each AVG gains a COUNT_FIELD companion over the
    /// same field.
    pub fn accumulators(requested: &[GroupOperation]) -> Vec<GroupOperation> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::with_capacity(requested.len());
        for op in requested {
            if seen.insert(op.clone()) {
                out.push(op.clone());
            }
            if let (GroupOperationType::Avg, Some(field)) = (op.op_type, op.field()) {
                let companion = GroupOperation::count_field(field);
                if seen.insert(companion.clone()) {
                    out.push(companion);
                }
            }
        }
        out
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl PartialEq for GroupOperation {
    fn eq(&self, other: &Self) -> bool {
        self.op_type == other.op_type && self.field == other.field
    }
}

impl Eq for GroupOperation {}

impl Hash for GroupOperation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.op_type.hash(state);
        self.field.hash(state);
    }
}

impl fmt::Display for GroupOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}({})", self.op_type, field)?,
            None => write!(f, "{}(*)", self.op_type)?,
        }
        if let Some(name) = &self.name {
            write!(f, " AS {}", name)?;
        }
        Ok(())
    }
}
