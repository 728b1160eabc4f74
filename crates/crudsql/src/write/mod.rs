//! INSERT / UPDATE / DELETE / upsert statements.
//!
//! A [`WriteBuilder`] holds a table, an optional row identifier, and an
//! ordered field → [`WriteValue`] map. Literal values are escaped by the
//! injected escaper; increments are validated integers rendered as
//! `col = col + (delta)`.


use crate::Context;
use crate::ast::{
    AssignValue, Assignment, ColumnRef, Delete, Expr, Insert, Render, Statement, Update, to_sql,
};
use crate::error::{SqlError, SqlResult};
use crate::ident;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Operation tag marking a write value as an operation rather than data.
const OP_KEY: &str = "__op";

/// The value written to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    /// Escaped literal.
    Value(Value),
    /// `col = col + (delta)` on update; `delta` on insert.
    Increment(i64),
}

impl WriteValue {
    /// Interpret a descriptor value: `{"__op": "Increment", "amount": n}` is an
    /// increment, anything else is a literal.
    pub fn from_json(field: &str, value: Value) -> SqlResult<Self> {
        let Value::Object(map) = &value else {
            return Ok(WriteValue::Value(value));
        };
        let Some(op) = map.get(OP_KEY) else {
            return Ok(WriteValue::Value(value));
        };
        match op.as_str() {
            Some("Increment") => map
                .get("amount")
                .and_then(Value::as_i64)
                .map(WriteValue::Increment)
                .ok_or_else(|| SqlError::invalid_value(field, "increment amount must be an integer")),
            _ => Err(SqlError::UnknownOperator(op.to_string())),
        }
    }
}

impl From<Value> for WriteValue {
    fn from(value: Value) -> Self {
        WriteValue::Value(value)
    }
}

impl<'de> Deserialize<'de> for WriteValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        WriteValue::from_json("value", value).map_err(serde::de::Error::custom)
    }
}

/// Builder for statements that change rows of one table.
#[derive(Debug, Clone)]
pub struct WriteBuilder<'a> {
    ctx: Context<'a>,
    table: String,
    id: Option<Value>,
    fields: Vec<(String, WriteValue)>,
}

impl<'a> WriteBuilder<'a> {
    pub fn new(ctx: Context<'a>, table: impl Into<String>) -> Self {
        Self {
            ctx,
            table: table.into(),
            id: None,
            fields: Vec::new(),
        }
    }

    /// Target row, matched on the configured identifier key.
    pub fn id(mut self, id: impl Into<Value>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set a column; setting the same column again replaces its value.
    pub fn value(mut self, column: impl Into<String>, value: WriteValue) -> Self {
        let column = column.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
        self
    }

    pub fn set(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.value(column, WriteValue::Value(value.into()))
    }

    pub fn increment(self, column: impl Into<String>, delta: i64) -> Self {
        self.value(column, WriteValue::Increment(delta))
    }

    pub fn values<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, WriteValue)>,
        K: Into<String>,
    {
        for (column, value) in values {
            self = self.value(column, value);
        }
        self
    }

    /// `INSERT INTO t (...) VALUES (...)`
    pub fn create(&self) -> SqlResult<String> {
        let insert = self.insert()?;
        self.render(&Statement::Insert(insert), "create")
    }

    /// `UPDATE t SET ... WHERE id = <id>`
    pub fn update(&self) -> SqlResult<String> {
        let where_clause = self.where_id("update")?;
        let table = self.table()?;
        if self.fields.is_empty() {
            return Err(SqlError::EmptyStatement(format!(
                "update of '{table}' sets no fields"
            )));
        }

        let set = self
            .fields
            .iter()
            .map(|(column, value)| {
                let value = match value {
                    WriteValue::Value(v) => AssignValue::Literal(v.clone()),
                    WriteValue::Increment(delta) => {
                        AssignValue::Increment(self.checked_delta(column, *delta)?)
                    }
                };
                Ok(Assignment {
                    column: ident::validate(column)?.to_string(),
                    value,
                })
            })
            .collect::<SqlResult<Vec<_>>>()?;

        let update = Update {
            table: table.to_string(),
            set,
            where_clause,
        };
        self.render(&Statement::Update(update), "update")
    }

    /// `DELETE FROM t WHERE id = <id>`
    pub fn destroy(&self) -> SqlResult<String> {
        let where_clause = self.where_id("destroy")?;
        let delete = Delete {
            table: self.table()?.to_string(),
            where_clause,
        };
        self.render(&Statement::Delete(delete), "destroy")
    }

    /// `INSERT ... ON DUPLICATE KEY UPDATE ...`
    ///
    /// On conflict every written column except the identifier and the
    /// `exclude`d ones takes the value the INSERT tried to write (increments
    /// add to the stored value instead).
    pub fn upsert<I, S>(&self, exclude: I) -> SqlResult<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exclude: Vec<S> = exclude.into_iter().collect();
        let excluded = |column: &str| exclude.iter().any(|e| e.as_ref() == column);
        let key = self.ctx.config.identifier_key.as_str();

        let mut insert = self.insert()?;
        if insert.columns.is_empty() {
            return Err(SqlError::EmptyStatement(format!(
                "upsert into '{}' writes no fields",
                insert.table
            )));
        }

        for (column, value) in &self.fields {
            if column == key || excluded(column) {
                continue;
            }
            let value = match value {
                WriteValue::Value(_) => AssignValue::Inserted,
                WriteValue::Increment(delta) => AssignValue::Increment(*delta),
            };
            insert.on_duplicate.push(Assignment {
                column: column.clone(),
                value,
            });
        }

        // MySQL needs at least one assignment; a no-op keeps the stored row.
        if insert.on_duplicate.is_empty() {
            insert.on_duplicate.push(Assignment {
                column: insert.columns[0].clone(),
                value: AssignValue::Unchanged,
            });
        }

        self.render(&Statement::Insert(insert), "upsert")
    }

    fn table(&self) -> SqlResult<&str> {
        ident::validate(&self.table)
    }

    fn insert(&self) -> SqlResult<Insert> {
        let key = &self.ctx.config.identifier_key;
        let mut columns = Vec::with_capacity(self.fields.len() + 1);
        let mut values = Vec::with_capacity(self.fields.len() + 1);

        if let Some(id) = &self.id
            && !self.fields.iter().any(|(c, _)| c == key)
        {
            columns.push(ident::validate(key)?.to_string());
            values.push(scalar_id(id)?.clone());
        }

        for (column, value) in &self.fields {
            columns.push(ident::validate(column)?.to_string());
            values.push(match value {
                WriteValue::Value(v) => v.clone(),
                WriteValue::Increment(delta) => Value::from(self.checked_delta(column, *delta)?),
            });
        }

        Ok(Insert {
            table: self.table()?.to_string(),
            columns,
            values,
            on_duplicate: Vec::new(),
        })
    }

    fn where_id(&self, op: &'static str) -> SqlResult<Expr> {
        let id = self.id.as_ref().ok_or(SqlError::MissingIdentifier(op))?;
        let key = ident::validate(&self.ctx.config.identifier_key)?;
        Ok(Expr::eq(
            Expr::column(ColumnRef::new(key)),
            Expr::Literal(scalar_id(id)?.clone()),
        ))
    }

    /// Increments are embedded unescaped, so they must be bounded integers.
    fn checked_delta(&self, column: &str, delta: i64) -> SqlResult<i64> {
        let max = self.ctx.config.max_increment;
        if delta.unsigned_abs() > max.unsigned_abs() {
            return Err(SqlError::invalid_value(
                column,
                format!("increment {delta} exceeds the bound of {max}"),
            ));
        }
        Ok(delta)
    }

    fn render(&self, statement: &impl Render, op: &'static str) -> SqlResult<String> {
        let sql = to_sql(statement, self.ctx.escaper)?;
        tracing::trace!(target: "crudsql.compile", op, table = %self.table, sql = %sql, "compiled write");
        Ok(sql)
    }
}

fn scalar_id(id: &Value) -> SqlResult<&Value> {
    match id {
        Value::Array(_) | Value::Object(_) | Value::Null => {
            Err(SqlError::invalid_value("id", format!("expected a scalar, got {id}")))
        }
        v => Ok(v),
    }
}
