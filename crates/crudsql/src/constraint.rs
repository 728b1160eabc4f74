//! Field constraints for read statements.
//!
//! A [`ConstraintMap`] maps field names to one or more [`Constraint`]s. Entries
//! for one field are ANDed, and fields are ANDed with each other.
//!
//! # Example
//! ```
//! use crudsql::{Constraint, ConstraintMap};
//! use serde_json::json;
//!
//! let map: ConstraintMap = serde_json::from_value(json!({
//!     "age": {"gte": 18, "lt": 65},
//!     "email": {"ex": true}
//! }))?;
//! assert_eq!(map.len(), 2);
//!
//! let same = ConstraintMap::new()
//!     .with("age", Constraint::Gte(json!(18)))
//!     .with("age", Constraint::Lt(json!(65)))
//!     .with("email", Constraint::Exists(true));
//! assert_eq!(map, same);
//! # Ok::<(), serde_json::Error>(())
//! ```

use crate::error::{SqlError, SqlResult};
use crate::ordered::Ordered;
use crate::read::JoinSpec;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

/// The closed set of constraint operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// `str`: prefix match
    StartsWith,
    /// `end`: suffix match
    EndsWith,
    /// `has`: substring match over one or more columns
    Contains,
    /// `ex`: null test
    Exists,
    In,
    NotIn,
    /// `fi`: membership in a subquery
    InQuery,
    /// `nfi`
    NotInQuery,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Eq,
        Operator::Neq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::Contains,
        Operator::Exists,
        Operator::In,
        Operator::NotIn,
        Operator::InQuery,
        Operator::NotInQuery,
    ];

    /// Look up an operator by its descriptor token.
    pub fn from_token(token: &str) -> SqlResult<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.token() == token)
            .ok_or_else(|| SqlError::UnknownOperator(token.to_string()))
    }

    pub fn token(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::StartsWith => "str",
            Operator::EndsWith => "end",
            Operator::Contains => "has",
            Operator::Exists => "ex",
            Operator::In => "in",
            Operator::NotIn => "nin",
            Operator::InQuery => "fi",
            Operator::NotInQuery => "nfi",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One (operator, value) condition on a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Eq(Value),
    Neq(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// `true` compiles to `IS NOT NULL`, `false` to `IS NULL`.
    Exists(bool),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    InQuery(Box<SubqueryDescriptor>),
    NotInQuery(Box<SubqueryDescriptor>),
}

impl Constraint {
    /// Build a constraint from a descriptor `(token, value)` pair on `field`.
    pub fn parse(field: &str, token: &str, value: Value) -> SqlResult<Self> {
        let op = Operator::from_token(token)?;
        let constraint = match op {
            Operator::Eq => Constraint::Eq(scalar(field, op, value)?),
            Operator::Neq => Constraint::Neq(scalar(field, op, value)?),
            Operator::Gt => Constraint::Gt(scalar(field, op, value)?),
            Operator::Gte => Constraint::Gte(scalar(field, op, value)?),
            Operator::Lt => Constraint::Lt(scalar(field, op, value)?),
            Operator::Lte => Constraint::Lte(scalar(field, op, value)?),
            Operator::StartsWith => Constraint::StartsWith(pattern(field, op, value)?),
            Operator::EndsWith => Constraint::EndsWith(pattern(field, op, value)?),
            Operator::Contains => Constraint::Contains(pattern(field, op, value)?),
            Operator::Exists => match value {
                Value::Bool(b) => Constraint::Exists(b),
                other => return Err(expected(field, op, "a boolean", &other)),
            },
            Operator::In => Constraint::In(list(field, op, value)?),
            Operator::NotIn => Constraint::NotIn(list(field, op, value)?),
            Operator::InQuery => Constraint::InQuery(Box::new(subquery(field, value)?)),
            Operator::NotInQuery => Constraint::NotInQuery(Box::new(subquery(field, value)?)),
        };
        Ok(constraint)
    }

    pub fn operator(&self) -> Operator {
        match self {
            Constraint::Eq(_) => Operator::Eq,
            Constraint::Neq(_) => Operator::Neq,
            Constraint::Gt(_) => Operator::Gt,
            Constraint::Gte(_) => Operator::Gte,
            Constraint::Lt(_) => Operator::Lt,
            Constraint::Lte(_) => Operator::Lte,
            Constraint::StartsWith(_) => Operator::StartsWith,
            Constraint::EndsWith(_) => Operator::EndsWith,
            Constraint::Contains(_) => Operator::Contains,
            Constraint::Exists(_) => Operator::Exists,
            Constraint::In(_) => Operator::In,
            Constraint::NotIn(_) => Operator::NotIn,
            Constraint::InQuery(_) => Operator::InQuery,
            Constraint::NotInQuery(_) => Operator::NotInQuery,
        }
    }
}

fn expected(field: &str, op: Operator, what: &str, got: &Value) -> SqlError {
    SqlError::invalid_value(field, format!("'{op}' expects {what}, got {got}"))
}

fn scalar(field: &str, op: Operator, value: Value) -> SqlResult<Value> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(expected(field, op, "a scalar", &value)),
        v => Ok(v),
    }
}

fn pattern(field: &str, op: Operator, value: Value) -> SqlResult<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(expected(field, op, "a string", &other)),
    }
}

fn list(field: &str, op: Operator, value: Value) -> SqlResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(expected(field, op, "an array", &other)),
    }
}

fn subquery(field: &str, value: Value) -> SqlResult<SubqueryDescriptor> {
    serde_json::from_value(value)
        .map_err(|e| SqlError::invalid_value(field, format!("invalid subquery: {e}")))
}

/// Ordered field → constraints mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintMap {
    entries: Vec<(String, Vec<Constraint>)>,
}

impl ConstraintMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint on `field`, keeping the field's first position.
    pub fn add(&mut self, field: impl Into<String>, constraint: Constraint) -> &mut Self {
        let field = field.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, list)) => list.push(constraint),
            None => self.entries.push((field, vec![constraint])),
        }
        self
    }

    pub fn with(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.add(field, constraint);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of constrained fields.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Constraint])> {
        self.entries.iter().map(|(f, c)| (f.as_str(), c.as_slice()))
    }

    /// Build from a `{field: {operator: value}}` JSON document.
    pub fn from_json(value: Value) -> SqlResult<Self> {
        let raw: Ordered<Ordered<Value>> = serde_json::from_value(value)?;
        Self::from_entries(raw)
    }

    fn from_entries(raw: Ordered<Ordered<Value>>) -> SqlResult<Self> {
        let mut map = Self::new();
        for (field, ops) in raw.0 {
            for (token, value) in ops.0 {
                let constraint = Constraint::parse(&field, &token, value)?;
                map.add(field.clone(), constraint);
            }
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for ConstraintMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Ordered::<Ordered<Value>>::deserialize(deserializer)?;
        Self::from_entries(raw).map_err(serde::de::Error::custom)
    }
}

/// The value of an `fi`/`nfi` constraint: a nested read over another table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubqueryDescriptor {
    pub table: String,
    /// Single column to select; `alias.field` reads through a join.
    pub select: String,
    #[serde(default, rename = "where")]
    pub where_clause: ConstraintMap,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl SubqueryDescriptor {
    pub fn new(table: impl Into<String>, select: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: select.into(),
            where_clause: ConstraintMap::new(),
            joins: Vec::new(),
            skip: None,
            limit: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.where_clause.add(field, constraint);
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}
