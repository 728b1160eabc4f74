//! Value escaping and identifier quoting.
//!
//! Builders never format values themselves: every literal passes through
//! [`Escaper::escape`] and every identifier through
//! [`Escaper::quote_identifier`]. The escaper is owned by the database adapter
//! and injected into each builder.

use crate::error::{SqlError, SqlResult};
use serde_json::Value;

/// Renders values and identifiers safely into SQL text.
///
/// Implementations must be usable from several compilations at once.
pub trait Escaper: Send + Sync {
    /// Render a literal value.
    fn escape(&self, value: &Value) -> SqlResult<String>;

    /// Quote an identifier. Dotted paths are quoted per segment.
    fn quote_identifier(&self, name: &str) -> SqlResult<String>;
}

impl<E: Escaper + ?Sized> Escaper for &E {
    fn escape(&self, value: &Value) -> SqlResult<String> {
        (**self).escape(value)
    }

    fn quote_identifier(&self, name: &str) -> SqlResult<String> {
        (**self).quote_identifier(name)
    }
}

impl<E: Escaper + ?Sized> Escaper for std::sync::Arc<E> {
    fn escape(&self, value: &Value) -> SqlResult<String> {
        (**self).escape(value)
    }

    fn quote_identifier(&self, name: &str) -> SqlResult<String> {
        (**self).quote_identifier(name)
    }
}

/// MySQL escaping rules.
///
/// - strings: single-quoted, backslash escapes for `\0 \b \t \n \r " ' \`, `\x1a` as `\Z`
/// - numbers: verbatim
/// - booleans: `true` / `false`
/// - null: `NULL`
/// - arrays: comma-separated escaped items
/// - objects: escaped JSON text
/// - identifiers: backtick-quoted, embedded backticks doubled
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlEscaper;

impl MySqlEscaper {
    pub fn new() -> Self {
        Self
    }

    fn escape_str(s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\0' => out.push_str("\\0"),
                '\u{8}' => out.push_str("\\b"),
                '\t' => out.push_str("\\t"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\u{1a}' => out.push_str("\\Z"),
                '"' => out.push_str("\\\""),
                '\'' => out.push_str("\\'"),
                '\\' => out.push_str("\\\\"),
                c => out.push(c),
            }
        }
        out.push('\'');
        out
    }
}

impl Escaper for MySqlEscaper {
    fn escape(&self, value: &Value) -> SqlResult<String> {
        match value {
            Value::Null => Ok("NULL".to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Number(n) => Ok(n.to_string()),
            Value::String(s) => Ok(Self::escape_str(s)),
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(|v| self.escape(v))
                    .collect::<SqlResult<Vec<_>>>()?;
                Ok(parts.join(", "))
            }
            Value::Object(_) => Ok(Self::escape_str(&value.to_string())),
        }
    }

    fn quote_identifier(&self, name: &str) -> SqlResult<String> {
        if name.is_empty() {
            return Err(SqlError::Escape("empty identifier".to_string()));
        }
        if name.contains('\0') {
            return Err(SqlError::Escape(
                "identifier cannot contain NUL character".to_string(),
            ));
        }
        let quoted = name
            .split('.')
            .map(|seg| format!("`{}`", seg.replace('`', "``")))
            .collect::<Vec<_>>();
        Ok(quoted.join("."))
    }
}
