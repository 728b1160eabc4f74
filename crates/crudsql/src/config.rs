use serde::Deserialize;

/// Largest increment accepted by `col = col + (delta)` (2^53 - 1).
pub const DEFAULT_MAX_INCREMENT: i64 = 9_007_199_254_740_991;

/// Configuration shared by every builder handed out by a
/// [`SqlCompiler`](crate::SqlCompiler).
///
/// All fields have defaults, so an empty `[compiler]` table (or none at all)
/// is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Row identifier column used by UPDATE/DELETE and default join targets.
    pub identifier_key: String,
    /// Delimiter splitting a `has` key into several concatenated columns.
    pub has_delimiter: char,
    /// Bound on the magnitude of an increment delta.
    pub max_increment: i64,
    /// Maximum nesting of `fi`/`nfi` subqueries.
    pub max_subquery_depth: usize,
    /// Truncate logged SQL (in bytes). `None` disables truncation.
    pub log_max_sql_length: Option<usize>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            identifier_key: "id".to_string(),
            has_delimiter: '|',
            max_increment: DEFAULT_MAX_INCREMENT,
            max_subquery_depth: 8,
            log_max_sql_length: Some(200),
        }
    }
}

impl CompilerConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifier column (default `id`).
    pub fn with_identifier_key(mut self, key: impl Into<String>) -> Self {
        self.identifier_key = key.into();
        self
    }

    /// Set the `has` multi-column delimiter (default `|`).
    pub fn with_has_delimiter(mut self, delimiter: char) -> Self {
        self.has_delimiter = delimiter;
        self
    }

    /// Set the increment bound.
    pub fn with_max_increment(mut self, max: i64) -> Self {
        self.max_increment = max;
        self
    }

    /// Set the subquery nesting limit.
    pub fn with_max_subquery_depth(mut self, depth: usize) -> Self {
        self.max_subquery_depth = depth;
        self
    }

    /// Set maximum SQL length to log.
    pub fn with_log_max_sql_length(mut self, len: usize) -> Self {
        self.log_max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_log_truncate(mut self) -> Self {
        self.log_max_sql_length = None;
        self
    }
}
