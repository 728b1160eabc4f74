//! CREATE / ALTER / DROP TABLE statements.
//!
//! Column types come from [`FieldDefinition::sql_type`]; `unique` addons are
//! gathered into one table-level `UNIQUE (...)` clause instead of being
//! rendered inline.


use crate::Context;
use crate::ast::{AlterOp, AlterTable, ColumnDef, CreateTable, DropTable, Statement, to_sql};
use crate::error::{SqlError, SqlResult};
use crate::field::{Addon, AlterAction, AlterField, FieldDefinition};
use crate::ident;

/// Builder for DDL statements on one table.
#[derive(Debug, Clone)]
pub struct SchemaBuilder<'a> {
    ctx: Context<'a>,
    table: String,
    fields: Vec<(String, FieldDefinition)>,
    alters: Vec<(String, AlterField)>,
}

impl<'a> SchemaBuilder<'a> {
    pub fn new(ctx: Context<'a>, table: impl Into<String>) -> Self {
        Self {
            ctx,
            table: table.into(),
            fields: Vec::new(),
            alters: Vec::new(),
        }
    }

    /// Add a column for CREATE TABLE.
    pub fn field(mut self, name: impl Into<String>, definition: FieldDefinition) -> Self {
        self.fields.push((name.into(), definition));
        self
    }

    pub fn fields<I, K>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, FieldDefinition)>,
        K: Into<String>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, def)| (k.into(), def)));
        self
    }

    /// Add a column change for ALTER TABLE.
    pub fn alter_field(mut self, name: impl Into<String>, change: AlterField) -> Self {
        self.alters.push((name.into(), change));
        self
    }

    pub fn alter_fields<I, K>(mut self, changes: I) -> Self
    where
        I: IntoIterator<Item = (K, AlterField)>,
        K: Into<String>,
    {
        self.alters
            .extend(changes.into_iter().map(|(k, change)| (k.into(), change)));
        self
    }

    /// `CREATE TABLE t (...)`
    pub fn create(&self) -> SqlResult<String> {
        let create = self.create_table(false)?;
        self.render(Statement::CreateTable(create), "create")
    }

    /// `CREATE TABLE IF NOT EXISTS t (...)`
    pub fn create_if_missing(&self) -> SqlResult<String> {
        let create = self.create_table(true)?;
        self.render(Statement::CreateTable(create), "create_if_missing")
    }

    /// `ALTER TABLE t ADD ..., MODIFY ..., DROP COLUMN ..., CHANGE COLUMN ...`
    pub fn alter(&self) -> SqlResult<String> {
        let table = self.table()?;
        if self.alters.is_empty() {
            return Err(SqlError::EmptyStatement(format!(
                "alter of '{table}' changes no fields"
            )));
        }

        let mut ops = Vec::with_capacity(self.alters.len() + 1);
        let mut unique = Vec::new();
        for (name, change) in &self.alters {
            let name = ident::validate(name)?;
            let (target, definition) = match change.action {
                AlterAction::Drop => {
                    ops.push(AlterOp::Drop(name.to_string()));
                    continue;
                }
                AlterAction::Rename => {
                    let new_name = change.new_name.as_deref().ok_or_else(|| {
                        SqlError::invalid_value(name, "rename requires a new name")
                    })?;
                    (ident::validate(new_name)?, definition_of(name, change)?)
                }
                AlterAction::Add | AlterAction::Modify => (name, definition_of(name, change)?),
            };
            if definition.has(Addon::Unique) {
                unique.push(target.to_string());
            }

            let def = definition.column_def(target);
            ops.push(match change.action {
                AlterAction::Add => AlterOp::Add(def),
                AlterAction::Modify => AlterOp::Modify(def),
                _ => AlterOp::Change {
                    from: name.to_string(),
                    def,
                },
            });
        }
        if !unique.is_empty() {
            ops.push(AlterOp::AddUnique(unique));
        }

        let alter = AlterTable {
            table: table.to_string(),
            ops,
        };
        self.render(Statement::AlterTable(alter), "alter")
    }

    /// `DROP TABLE t`
    pub fn drop(&self) -> SqlResult<String> {
        self.drop_table(false)
    }

    /// `DROP TABLE IF EXISTS t`
    pub fn drop_if_exists(&self) -> SqlResult<String> {
        self.drop_table(true)
    }

    fn table(&self) -> SqlResult<&str> {
        ident::validate(&self.table)
    }

    fn create_table(&self, if_not_exists: bool) -> SqlResult<CreateTable> {
        let table = self.table()?;
        if self.fields.is_empty() {
            return Err(SqlError::EmptyStatement(format!(
                "table '{table}' has no fields"
            )));
        }

        let mut columns = Vec::with_capacity(self.fields.len());
        let mut unique = Vec::new();
        for (name, definition) in &self.fields {
            let name = ident::validate(name)?;
            if columns.iter().any(|c: &ColumnDef| c.name == name) {
                return Err(SqlError::invalid_value(name, "column defined twice"));
            }
            if definition.has(Addon::Unique) {
                unique.push(name.to_string());
            }
            columns.push(definition.column_def(name));
        }

        Ok(CreateTable {
            table: table.to_string(),
            if_not_exists,
            columns,
            unique,
        })
    }

    fn drop_table(&self, if_exists: bool) -> SqlResult<String> {
        let drop = DropTable {
            table: self.table()?.to_string(),
            if_exists,
        };
        let op = if if_exists { "drop_if_exists" } else { "drop" };
        self.render(Statement::DropTable(drop), op)
    }

    fn render(&self, statement: Statement, op: &'static str) -> SqlResult<String> {
        let sql = to_sql(&statement, self.ctx.escaper)?;
        tracing::trace!(target: "crudsql.compile", op, table = %self.table, sql = %sql, "compiled ddl");
        Ok(sql)
    }
}

fn definition_of<'f>(name: &str, change: &'f AlterField) -> SqlResult<&'f FieldDefinition> {
    change.definition.as_ref().ok_or_else(|| {
        SqlError::invalid_value(name, format!("{:?} requires a definition", change.action))
    })
}
