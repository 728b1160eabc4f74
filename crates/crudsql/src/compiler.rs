use crate::config::CompilerConfig;
use crate::escape::Escaper;
use crate::read::ReadBuilder;
use crate::schema::SchemaBuilder;
use crate::write::WriteBuilder;
use std::fmt;

/// What every builder borrows: the escaper and the configuration.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub escaper: &'a dyn Escaper,
    pub config: &'a CompilerConfig,
}

impl<'a> Context<'a> {
    pub fn new(escaper: &'a dyn Escaper, config: &'a CompilerConfig) -> Self {
        Self { escaper, config }
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

/// Hands out statement builders bound to one escaper and configuration.
///
/// The compiler holds no mutable state; share it freely (`&SqlCompiler` or
/// `Arc<SqlCompiler>`) and create one builder per statement.
///
/// ```
/// use crudsql::{MySqlEscaper, SqlCompiler};
///
/// let compiler = SqlCompiler::new(MySqlEscaper);
/// let sql = compiler.write("widgets").id(7).destroy()?;
/// assert_eq!(sql, "DELETE FROM `widgets` WHERE `id` = 7");
/// # Ok::<(), crudsql::SqlError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SqlCompiler<E> {
    escaper: E,
    config: CompilerConfig,
}

impl<E: Escaper> SqlCompiler<E> {
    /// Create a compiler with the default configuration.
    pub fn new(escaper: E) -> Self {
        Self::with_config(escaper, CompilerConfig::default())
    }

    pub fn with_config(escaper: E, config: CompilerConfig) -> Self {
        Self { escaper, config }
    }

    pub fn escaper(&self) -> &E {
        &self.escaper
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn context(&self) -> Context<'_> {
        Context::new(&self.escaper, &self.config)
    }

    /// Start a SELECT over `table`.
    pub fn read(&self, table: impl Into<String>) -> ReadBuilder<'_> {
        ReadBuilder::new(self.context(), table)
    }

    /// Start an INSERT / UPDATE / DELETE / upsert on `table`.
    pub fn write(&self, table: impl Into<String>) -> WriteBuilder<'_> {
        WriteBuilder::new(self.context(), table)
    }

    /// Start a CREATE / ALTER / DROP TABLE on `table`.
    pub fn schema(&self, table: impl Into<String>) -> SchemaBuilder<'_> {
        SchemaBuilder::new(self.context(), table)
    }
}
