//! SELECT statements.
//!
//! A [`ReadBuilder`] collects a selection, joins, constraints, sort order and
//! pagination, then compiles them into one [`Select`] node. Nothing is checked
//! until compile time; every method on the builder just records input.
//!
//! # Example
//! ```
//! use crudsql::{Constraint, JoinSpec, MySqlEscaper, SqlCompiler, FieldSelection};
//! use serde_json::json;
//!
//! let compiler = SqlCompiler::new(MySqlEscaper);
//! let sql = compiler
//!     .read("pets")
//!     .select("name")
//!     .select(FieldSelection::joined("owner", "name"))
//!     .join(JoinSpec::new("owners", "owner").via("owner_id"))
//!     .filter("age", Constraint::Gte(json!(2)))
//!     .limit(20)
//!     .find()?;
//!
//! assert_eq!(
//!     sql,
//!     "SELECT `pets`.`name` AS `name`, `owner`.`name` AS `owner_name` FROM `pets` \
//!      LEFT OUTER JOIN `owners` AS `owner` ON `pets`.`owner_id` = `owner`.`id` \
//!      WHERE `pets`.`age` >= 2 LIMIT 20"
//! );
//! # Ok::<(), crudsql::SqlError>(())
//! ```

mod filter;
mod join;

#[cfg(test)]
mod tests;

pub use join::JoinSpec;

use crate::Context;
use crate::ast::{
    AliasScope, ColumnRef, Limit, OrderBy, OrderDir, Projection, Select, SelectItem, TableRef,
    to_sql,
};
use crate::constraint::{Constraint, ConstraintMap};
use crate::error::{SqlError, SqlResult};
use crate::ident::{self, Ident};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

/// Output column alias used by [`ReadBuilder::count`].
pub const COUNT_ALIAS: &str = "count";

/// One selected column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldSelection {
    /// A column of the primary table (or `alias.field`), output under its own
    /// name with dots replaced by underscores.
    Field(String),
    /// A column read through a join, output as `as` or `<joinAlias>_<field>`.
    #[serde(rename_all = "camelCase")]
    Joined {
        join_alias: String,
        field: String,
        #[serde(default, rename = "as")]
        output: Option<String>,
    },
}

impl FieldSelection {
    pub fn field(name: impl Into<String>) -> Self {
        FieldSelection::Field(name.into())
    }

    pub fn joined(join_alias: impl Into<String>, field: impl Into<String>) -> Self {
        FieldSelection::Joined {
            join_alias: join_alias.into(),
            field: field.into(),
            output: None,
        }
    }

    /// Rename the output column of a joined selection.
    pub fn output_as(self, name: impl Into<String>) -> Self {
        match self {
            FieldSelection::Joined {
                join_alias, field, ..
            } => FieldSelection::Joined {
                join_alias,
                field,
                output: Some(name.into()),
            },
            other => other,
        }
    }

    fn source(&self) -> String {
        match self {
            FieldSelection::Field(f) => f.clone(),
            FieldSelection::Joined {
                join_alias, field, ..
            } => format!("{join_alias}.{field}"),
        }
    }

    pub fn output_alias(&self) -> String {
        match self {
            FieldSelection::Field(f) => f.replace('.', "_"),
            FieldSelection::Joined {
                join_alias,
                field,
                output,
            } => output
                .clone()
                .unwrap_or_else(|| format!("{join_alias}_{field}")),
        }
    }
}

impl From<&str> for FieldSelection {
    fn from(name: &str) -> Self {
        FieldSelection::Field(name.to_string())
    }
}

impl From<String> for FieldSelection {
    fn from(name: String) -> Self {
        FieldSelection::Field(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Names a SELECT can refer to: its primary table reference, its join
/// aliases, and everything visible in enclosing queries.
pub(crate) struct Names<'p> {
    primary: String,
    aliases: Vec<String>,
    parent: Option<&'p Names<'p>>,
}

impl Names<'_> {
    fn primary(&self) -> &str {
        &self.primary
    }

    fn knows(&self, name: &str) -> bool {
        self.primary == name
            || self.aliases.iter().any(|a| a == name)
            || self.parent.is_some_and(|p| p.knows(name))
    }

    /// Resolve `field` or `alias.field`; bare names get `default` as qualifier.
    fn column_in(&self, default: &str, field: &str) -> SqlResult<ColumnRef> {
        match Ident::parse(field)?.into_parts() {
            (None, name) => Ok(ColumnRef::qualified(default, name)),
            (Some(q), name) if self.knows(&q) => Ok(ColumnRef::qualified(q, name)),
            (Some(q), _) => Err(SqlError::UnknownAlias(q)),
        }
    }

    fn column(&self, field: &str) -> SqlResult<ColumnRef> {
        self.column_in(&self.primary, field)
    }
}

/// Builder for SELECT statements over one primary table.
#[derive(Clone)]
pub struct ReadBuilder<'a> {
    ctx: Context<'a>,
    table: String,
    selection: Vec<FieldSelection>,
    joins: Vec<JoinSpec>,
    constraints: ConstraintMap,
    sort: Vec<SortSpec>,
    skip: Option<u64>,
    limit: Option<u64>,
    subquery: bool,
}

impl<'a> ReadBuilder<'a> {
    pub fn new(ctx: Context<'a>, table: impl Into<String>) -> Self {
        Self {
            ctx,
            table: table.into(),
            selection: Vec::new(),
            joins: Vec::new(),
            constraints: ConstraintMap::new(),
            sort: Vec::new(),
            skip: None,
            limit: None,
            subquery: false,
        }
    }

    /// Add a column to the selection. An empty selection reads `*`.
    pub fn select(mut self, field: impl Into<FieldSelection>) -> Self {
        self.selection.push(field.into());
        self
    }

    pub fn select_all<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<FieldSelection>,
    {
        self.selection.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    pub fn filter(mut self, field: impl Into<String>, constraint: Constraint) -> Self {
        self.constraints.add(field, constraint);
        self
    }

    /// Shorthand for `filter(field, Constraint::Eq(value))`.
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, Constraint::Eq(value.into()))
    }

    /// Merge a whole constraint map into this builder's constraints.
    pub fn constraints(mut self, constraints: ConstraintMap) -> Self {
        for (field, list) in constraints.iter() {
            for c in list {
                self.constraints.add(field, c.clone());
            }
        }
        self
    }

    pub fn sort(mut self, spec: SortSpec) -> Self {
        self.sort.push(spec);
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

    /// Alias the primary table with a generated name so the statement can be
    /// embedded in a query over the same table.
    pub fn subquery(mut self, subquery: bool) -> Self {
        self.subquery = subquery;
        self
    }

    /// Compile into a statement node without rendering it.
    pub fn statement(&self) -> SqlResult<Select> {
        self.compile(&mut AliasScope::new(), None, 0)
    }

    /// Compile the full SELECT.
    pub fn find(&self) -> SqlResult<String> {
        let select = self.statement()?;
        self.render(&select, "find")
    }

    /// Compile the SELECT with the limit forced to one row.
    pub fn first(&self) -> SqlResult<String> {
        let mut select = self.statement()?;
        select.limit.count = Some(1);
        self.render(&select, "first")
    }

    /// Compile `SELECT COUNT(*) AS count` over the same rows, ignoring sort
    /// and pagination.
    pub fn count(&self) -> SqlResult<String> {
        let mut select = self.statement()?;
        select.projection = Projection::Count(COUNT_ALIAS.to_string());
        select.order_by.clear();
        select.limit = Limit::default();
        self.render(&select, "count")
    }

    pub(crate) fn log_max_sql_length(&self) -> Option<usize> {
        self.ctx.config.log_max_sql_length
    }

    fn render(&self, select: &Select, op: &'static str) -> SqlResult<String> {
        let sql = to_sql(select, self.ctx.escaper)?;
        tracing::trace!(target: "crudsql.compile", op, table = %self.table, sql = %sql, "compiled select");
        Ok(sql)
    }

    pub(crate) fn compile(
        &self,
        scope: &mut AliasScope,
        parent: Option<&Names<'_>>,
        depth: usize,
    ) -> SqlResult<Select> {
        let max_depth = self.ctx.config.max_subquery_depth;
        if depth > max_depth {
            return Err(SqlError::SubqueryTooDeep(max_depth));
        }

        let table = ident::validate(&self.table)?;
        let mut aliases: Vec<String> = Vec::with_capacity(self.joins.len());
        for join in &self.joins {
            let alias = ident::validate(&join.alias)?;
            if aliases.iter().any(|a| a == alias) || (!self.subquery && alias == table) {
                return Err(SqlError::DuplicateAlias(alias.to_string()));
            }
            aliases.push(alias.to_string());
        }

        scope.reserve(table);
        for alias in &aliases {
            scope.reserve(alias);
        }
        let from = if self.subquery {
            TableRef::aliased(table, scope.allocate(depth))
        } else {
            TableRef::new(table)
        };

        let names = Names {
            primary: from.reference().to_string(),
            aliases: aliases.clone(),
            parent,
        };

        let mut select = Select::from(from);

        for (i, join) in self.joins.iter().enumerate() {
            let compiled = join.compile(self.ctx, &names, &aliases[..i], scope, depth)?;
            select.joins.push(compiled);
        }

        select.projection = self.projection(&names)?;
        select.where_clause = filter::compile(
            self.ctx,
            &names,
            names.primary(),
            &self.constraints,
            scope,
            depth,
        )?;

        for spec in &self.sort {
            select.order_by.push(OrderBy {
                column: names.column(&spec.field)?,
                direction: match spec.direction {
                    SortDirection::Asc => OrderDir::Asc,
                    SortDirection::Desc => OrderDir::Desc,
                },
            });
        }

        if let (Some(skip), None) = (self.skip, self.limit) {
            tracing::warn!(
                target: "crudsql.compile",
                table = %self.table,
                skip,
                "skip without limit renders LIMIT skip, 0 and matches no rows"
            );
        }
        select.limit = Limit {
            skip: self.skip,
            count: self.limit,
        };

        Ok(select)
    }

    fn projection(&self, names: &Names<'_>) -> SqlResult<Projection> {
        if self.selection.is_empty() {
            return Ok(Projection::All);
        }

        let mut seen = HashSet::with_capacity(self.selection.len());
        let mut items = Vec::with_capacity(self.selection.len());
        for field in &self.selection {
            let source = names.column(&field.source())?;
            let alias = if self.subquery {
                None
            } else {
                let output = field.output_alias();
                ident::validate(&output)?;
                if !seen.insert(output.clone()) {
                    return Err(SqlError::AmbiguousSelection(output));
                }
                Some(output)
            };
            items.push(SelectItem { source, alias });
        }
        Ok(Projection::Columns(items))
    }
}
