/*!
# Expression Abstract Syntax Tree

This module defines the expression tree evaluated by the execution core. The
tree is produced by an external parser or built directly by callers; the core
only consumes it.

## Node Kinds

- **Column**: a field reference, optionally a dotted path into a map or list (`stats.max`, `tags.0`)
- **Literal**: a textual payload paired with its declared kind, parsed at evaluation time
- **BinaryOp**: arithmetic (`+ - * /`), comparison and logical operators
- **UnaryOp**: negation, `NOT`, `IS NULL` / `IS NOT NULL`
- **Cast**: forced conversion to a target kind
- **SizeOf**: element count of a list or map field
- **Nested**: parenthesization, kept so a printed tree round-trips visually

## Example

```rust
use velocore::velocore::sql::ast::{BinaryOperator, Expr};
use velocore::velocore::sql::execution::types::FieldKind;

// (price * 2) > 100
let expr = Expr::binary(
    Expr::nested(Expr::binary(
        Expr::column("price"),
        BinaryOperator::Multiply,
        Expr::literal("2", FieldKind::Integer),
    )),
    BinaryOperator::GreaterThan,
    Expr::literal("100", FieldKind::Long),
);
assert_eq!(expr.to_string(), "(price * 2) > 100");
```
*/

use crate::velocore::sql::execution::types::FieldKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Column reference
    Column(String),
    /// Typed literal; `value` has surrounding quote syntax already stripped
    Literal { value: String, kind: FieldKind },
    /// Binary operations: expr op expr
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Unary operations: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    /// CAST(expr AS kind)
    Cast { expr: Box<Expr>, kind: FieldKind },
    /// SIZEOF(field)
    SizeOf(String),
    /// ( expr )
    Nested(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Subtract
                | BinaryOperator::Multiply
                | BinaryOperator::Divide
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
    IsNull,
    IsNotNull,
}

/// Sort direction for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn literal(value: impl Into<String>, kind: FieldKind) -> Self {
        Expr::Literal {
            value: value.into(),
            kind,
        }
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOperator, expr: Expr) -> Self {
        Expr::UnaryOp {
            op,
            expr: Box::new(expr),
        }
    }

    pub fn cast(expr: Expr, kind: FieldKind) -> Self {
        Expr::Cast {
            expr: Box::new(expr),
            kind,
        }
    }

    pub fn size_of(field: impl Into<String>) -> Self {
        Expr::SizeOf(field.into())
    }

    pub fn nested(expr: Expr) -> Self {
        Expr::Nested(Box::new(expr))
    }

    /// Collect every field name this expression reads, in first-seen order.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, out: &mut Vec<String>) {
        match self {
            Expr::Column(name) | Expr::SizeOf(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Expr::Literal { .. } => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
            Expr::UnaryOp { expr, .. } | Expr::Cast { expr, .. } | Expr::Nested(expr) => {
                expr.collect_fields(out)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", name),
            Expr::Literal { value, kind } => match kind {
                FieldKind::String => write!(f, "'{}'", value),
                _ => write!(f, "{}", value),
            },
            Expr::BinaryOp { left, op, right } => write!(f, "{} {} {}", left, op.symbol(), right),
            Expr::UnaryOp { op, expr } => match op {
                UnaryOperator::Not => write!(f, "NOT {}", expr),
                UnaryOperator::Minus => write!(f, "-{}", expr),
                UnaryOperator::IsNull => write!(f, "{} IS NULL", expr),
                UnaryOperator::IsNotNull => write!(f, "{} IS NOT NULL", expr),
            },
            Expr::Cast { expr, kind } => write!(f, "CAST({} AS {})", expr, kind),
            Expr::SizeOf(field) => write!(f, "SIZEOF({})", field),
            Expr::Nested(expr) => write!(f, "({})", expr),
        }
    }
}
