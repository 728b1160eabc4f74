//! Error types for crudsql

use thiserror::Error;

/// Result type alias for crudsql operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Boxed error returned by an [`Adapter`](crate::adapter::Adapter).
pub type AdapterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for statement compilation and execution.
///
/// Every variant except [`SqlError::QueryFailed`] is a construction error: a
/// malformed descriptor detected while compiling, before anything reaches the
/// database.
#[derive(Debug, Error)]
pub enum SqlError {
    /// Operator token outside the closed operator set
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Identifier that cannot be embedded in generated SQL
    #[error("Invalid identifier '{ident}': {reason}")]
    InvalidIdentifier { ident: String, reason: String },

    /// Value of the wrong shape for its operator or column
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Join without `via` or `joinConstraints` (or with both)
    #[error("Missing join key for alias '{0}'")]
    MissingJoinKey(String),

    /// Alias declared twice in one statement
    #[error("Duplicate alias: {0}")]
    DuplicateAlias(String),

    /// Qualified reference to an alias the statement never declared
    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    /// Output alias used by more than one selection
    #[error("Ambiguous selection: {0}")]
    AmbiguousSelection(String),

    /// UPDATE/DELETE compiled without a row identifier
    #[error("Missing identifier: {0} requires an id")]
    MissingIdentifier(&'static str),

    /// Statement with nothing to do (no SET fields, no columns, ...)
    #[error("Empty statement: {0}")]
    EmptyStatement(String),

    /// Nested `fi`/`nfi` subqueries past the configured depth
    #[error("Subquery nesting exceeds maximum depth of {0}")]
    SubqueryTooDeep(usize),

    /// Descriptor document that does not deserialize
    #[error("Invalid descriptor: {0}")]
    Descriptor(String),

    /// Value the escaper refused to render
    #[error("Escape error: {0}")]
    Escape(String),

    /// The adapter failed to run a compiled statement.
    ///
    /// Driver detail stays in the `source()` chain; the statement text is kept
    /// for diagnostics.
    #[error("Query failed")]
    QueryFailed {
        sql: String,
        #[source]
        source: AdapterError,
    },
}

impl SqlError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(ident: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            ident: ident.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a descriptor error
    pub fn descriptor(message: impl Into<String>) -> Self {
        Self::Descriptor(message.into())
    }

    /// Wrap an adapter failure, keeping the statement that caused it
    pub fn query_failed(sql: impl Into<String>, source: AdapterError) -> Self {
        Self::QueryFailed {
            sql: sql.into(),
            source,
        }
    }

    /// Check if this error was raised while compiling a descriptor
    pub fn is_construction(&self) -> bool {
        !self.is_query_failed()
    }

    /// Check if this error was raised by the adapter
    pub fn is_query_failed(&self) -> bool {
        matches!(self, Self::QueryFailed { .. })
    }

    /// The statement text that failed, if this is an execution error
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::QueryFailed { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SqlError {
    fn from(err: serde_json::Error) -> Self {
        Self::descriptor(err.to_string())
    }
}
