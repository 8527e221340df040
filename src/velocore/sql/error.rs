/*!
# Error Handling

Every fallible operation in the execution core returns a [`SqlError`] carrying
enough context to explain what went wrong.

## Error Categories

- **Type Errors**: unsupported casts, arithmetic on non-numeric kinds, incomparable kinds
- **Unsupported Operations**: an operator that is not defined for a kind (e.g. negating an INTEGER)
- **Configuration Errors**: invalid aggregations, post-aggregations, table functions or engine settings.
  These are raised when the object is constructed, never while executing.
- **Lookup Errors**: a field that is absent from a record, or present with the wrong kind
- **Execution Errors**: runtime faults such as integer division by zero
- **Sketch Errors**: malformed serialized sketch payloads

## Examples

```rust
use velocore::velocore::sql::error::SqlError;

let error = SqlError::type_error("LONG", "STRING", Some("abc".to_string()));
assert_eq!(error.to_string(), "Type error: expected LONG, got STRING for value 'abc'");

let error = SqlError::lookup_error("price", "field not present in record");
assert!(error.is_lookup_error());
```
*/

/// Error type for expression evaluation, aggregation and post-aggregation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SqlError {
    /// A value could not be converted or combined because of its kind.
    #[error("Type error: expected {expected}, got {actual}{}", value_suffix(.value))]
    TypeError {
        /// Expected data type
        expected: String,
        /// Actual data type encountered
        actual: String,
        /// The value that caused the type error, if available
        value: Option<String>,
    },

    /// The operation exists but is not defined for the operand kind.
    #[error("Unsupported operation {operation} on {kind}")]
    UnsupportedOperation { operation: String, kind: String },

    /// An aggregation, post-aggregation, table function or config is invalid.
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// The field is absent from the record or does not match the record schema.
    #[error("Lookup error for field '{field}': {message}")]
    LookupError { field: String, message: String },

    /// Runtime failure during execution.
    #[error("Query execution error: {message}{}", query_suffix(.query))]
    ExecutionError {
        /// Description of the execution failure
        message: String,
        /// Query text that caused the error, if available
        query: Option<String>,
    },

    /// A serialized sketch could not be read back.
    #[error("Sketch error: {message}")]
    SketchError { message: String },
}

fn value_suffix(value: &Option<String>) -> String {
    match value {
        Some(v) => format!(" for value '{}'", v),
        None => String::new(),
    }
}

fn query_suffix(query: &Option<String>) -> String {
    match query {
        Some(q) => format!(" (in '{}')", q),
        None => String::new(),
    }
}

impl SqlError {
    /// Create a type error
    pub fn type_error(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: Option<String>,
    ) -> Self {
        SqlError::TypeError {
            expected: expected.into(),
            actual: actual.into(),
            value,
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(operation: impl Into<String>, kind: impl Into<String>) -> Self {
        SqlError::UnsupportedOperation {
            operation: operation.into(),
            kind: kind.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration_error(message: impl Into<String>) -> Self {
        SqlError::ConfigurationError {
            message: message.into(),
        }
    }

    /// Create a lookup error
    pub fn lookup_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        SqlError::LookupError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an execution error
    pub fn execution_error(message: impl Into<String>, query: Option<String>) -> Self {
        SqlError::ExecutionError {
            message: message.into(),
            query,
        }
    }

    /// Create a sketch error
    pub fn sketch_error(message: impl Into<String>) -> Self {
        SqlError::SketchError {
            message: message.into(),
        }
    }

    pub fn is_lookup_error(&self) -> bool {
        matches!(self, SqlError::LookupError { .. })
    }

    /// True for both [`SqlError::TypeError`] and [`SqlError::UnsupportedOperation`].
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            SqlError::TypeError { .. } | SqlError::UnsupportedOperation { .. }
        )
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, SqlError::ConfigurationError { .. })
    }
}

/// Result type for SQL operations
pub type SqlResult<T> = Result<T, SqlError>;
