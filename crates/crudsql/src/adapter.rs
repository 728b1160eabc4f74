//! The database adapter boundary.
//!
//! Builders only produce SQL text. An [`Adapter`] runs it; the helpers here
//! log the statement, run it, and fold any driver failure into
//! [`SqlError::QueryFailed`] so callers never see driver-specific errors.

use crate::compiler::SqlCompiler;
use crate::error::{AdapterError, SqlError, SqlResult};
use crate::escape::Escaper;
use crate::read::ReadBuilder;
use serde_json::Value;
use std::future::Future;

/// A result row keyed by output column alias.
pub type Row = serde_json::Map<String, Value>;

/// What an adapter reports after running a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    /// Identifier generated by an INSERT.
    pub inserted_id: Option<Value>,
    /// Rows changed by INSERT / UPDATE / DELETE.
    pub affected_rows: Option<u64>,
    /// Rows returned by a SELECT.
    pub rows: Option<Vec<Row>>,
}

impl ExecResult {
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Some(rows),
            ..Self::default()
        }
    }

    pub fn with_affected_rows(affected: u64) -> Self {
        Self {
            affected_rows: Some(affected),
            ..Self::default()
        }
    }

    /// Returned rows; statements that return none yield an empty list.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows.unwrap_or_default()
    }
}

/// A database connection (or pool) that escapes values and runs statements.
///
/// Implementations own their transport and pooling; they must be safe to use
/// from several tasks at once.
pub trait Adapter: Escaper {
    /// Run one SQL statement.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<ExecResult, AdapterError>> + Send;
}

/// The kind of a SQL statement, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    Other,
}

impl StatementKind {
    /// Classify a statement by its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        [
            ("SELECT", StatementKind::Select),
            ("INSERT", StatementKind::Insert),
            ("UPDATE", StatementKind::Update),
            ("DELETE", StatementKind::Delete),
            ("CREATE", StatementKind::Create),
            ("ALTER", StatementKind::Alter),
            ("DROP", StatementKind::Drop),
        ]
        .into_iter()
        .find(|(kw, _)| starts_with_keyword(trimmed, kw))
        .map_or(StatementKind::Other, |(_, kind)| kind)
    }
}

/// Skip leading whitespace, comments and opening parentheses.
fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") {
            match s.find('\n') {
                Some(pos) => {
                    s = &s[pos + 1..];
                    continue;
                }
                None => return "",
            }
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => {
                    s = &s[pos + 2..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    s.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && s[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

/// Cut `sql` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn display_sql(sql: &str, max_len: Option<usize>) -> String {
    match max_len {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

/// Run `sql` through `adapter`, wrapping failures into [`SqlError::QueryFailed`].
///
/// `log_max_sql_length` bounds how much of the statement is logged.
pub async fn execute<A: Adapter>(
    adapter: &A,
    sql: &str,
    log_max_sql_length: Option<usize>,
) -> SqlResult<ExecResult> {
    let kind = StatementKind::from_sql(sql);
    let logged = display_sql(sql, log_max_sql_length);
    tracing::debug!(target: "crudsql.sql", kind = ?kind, sql = %logged, "executing statement");

    match adapter.execute(sql).await {
        Ok(result) => {
            tracing::debug!(
                target: "crudsql.sql",
                kind = ?kind,
                affected_rows = ?result.affected_rows,
                rows = result.rows.as_ref().map(Vec::len),
                "statement finished"
            );
            Ok(result)
        }
        Err(source) => {
            tracing::error!(target: "crudsql.sql", kind = ?kind, sql = %logged, error = %source, "statement failed");
            Err(SqlError::query_failed(sql, source))
        }
    }
}

/// Compile `read` with [`ReadBuilder::find`] and return every row.
pub async fn fetch_all<A: Adapter>(adapter: &A, read: &ReadBuilder<'_>) -> SqlResult<Vec<Row>> {
    let sql = read.find()?;
    let result = execute(adapter, &sql, read.log_max_sql_length()).await?;
    Ok(result.into_rows())
}

/// Compile `read` with [`ReadBuilder::first`] and return the row, if any.
pub async fn fetch_first<A: Adapter>(
    adapter: &A,
    read: &ReadBuilder<'_>,
) -> SqlResult<Option<Row>> {
    let sql = read.first()?;
    let result = execute(adapter, &sql, read.log_max_sql_length()).await?;
    Ok(result.into_rows().into_iter().next())
}

impl<A: Adapter> SqlCompiler<A> {
    /// Run a compiled statement on the compiler's own adapter.
    pub async fn execute(&self, sql: &str) -> SqlResult<ExecResult> {
        execute(self.escaper(), sql, self.config().log_max_sql_length).await
    }

    pub async fn fetch_all(&self, read: &ReadBuilder<'_>) -> SqlResult<Vec<Row>> {
        fetch_all(self.escaper(), read).await
    }

    pub async fn fetch_first(&self, read: &ReadBuilder<'_>) -> SqlResult<Option<Row>> {
        fetch_first(self.escaper(), read).await
    }
}
