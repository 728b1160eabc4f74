//! Safe SQL identifier handling.
//!
//! Descriptor field, table and alias names arrive as plain strings and end up
//! inside generated SQL text, so every one of them is validated here first.
//!
//! - Each part must match `[A-Za-z_][A-Za-z0-9_$]*`
//! - A column reference may carry one qualifier: `alias.field`
//!
//! Quoting is left to the [`Escaper`](crate::escape::Escaper); this module only
//! decides what is allowed through.
//!
//! # Example
//! ```
//! use crudsql::Ident;
//!
//! let c = Ident::parse("owner.name")?;
//! assert_eq!(c.qualifier(), Some("owner"));
//! assert_eq!(c.name(), "name");
//! # Ok::<(), crudsql::SqlError>(())
//! ```

use crate::error::{SqlError, SqlResult};

/// Maximum identifier length accepted by MySQL.
const MAX_IDENT_LEN: usize = 64;

/// A validated column or table identifier, optionally qualified by an alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    qualifier: Option<String>,
    name: String,
}

impl Ident {
    /// Parse `name` or `qualifier.name`.
    pub fn parse(s: &str) -> SqlResult<Self> {
        let mut parts = s.split('.');
        let first = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (None, _) => Ok(Self {
                qualifier: None,
                name: validate_part(s, first)?.to_string(),
            }),
            (Some(second), None) => Ok(Self {
                qualifier: Some(validate_part(s, first)?.to_string()),
                name: validate_part(s, second)?.to_string(),
            }),
            (Some(_), Some(_)) => Err(SqlError::invalid_identifier(
                s,
                "at most one qualifier is allowed",
            )),
        }
    }

    /// Parse an unqualified name (table, alias, output column).
    pub fn simple(s: &str) -> SqlResult<Self> {
        Ok(Self {
            qualifier: None,
            name: validate_part(s, s)?.to_string(),
        })
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Split into `(qualifier, name)`.
    pub fn into_parts(self) -> (Option<String>, String) {
        (self.qualifier, self.name)
    }
}

/// Validate a bare identifier and hand it back.
pub fn validate(s: &str) -> SqlResult<&str> {
    validate_part(s, s)
}

fn validate_part<'a>(whole: &str, part: &'a str) -> SqlResult<&'a str> {
    if part.is_empty() {
        return Err(SqlError::invalid_identifier(whole, "empty identifier segment"));
    }
    if part.len() > MAX_IDENT_LEN {
        return Err(SqlError::invalid_identifier(
            whole,
            format!("longer than {MAX_IDENT_LEN} characters"),
        ));
    }

    let mut chars = part.chars();
    if let Some(first) = chars.next()
        && !(first == '_' || first.is_ascii_alphabetic())
    {
        return Err(SqlError::invalid_identifier(
            whole,
            format!("invalid start character '{first}'"),
        ));
    }
    if let Some(bad) = chars.find(|c| !(*c == '_' || *c == '$' || c.is_ascii_alphanumeric())) {
        return Err(SqlError::invalid_identifier(
            whole,
            format!("invalid character '{bad}'"),
        ));
    }
    Ok(part)
}
