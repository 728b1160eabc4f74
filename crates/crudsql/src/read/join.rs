use super::Names;
use super::filter;
use crate::Context;
use crate::ast::{AliasScope, ColumnRef, Expr, Join, TableRef};
use crate::constraint::ConstraintMap;
use crate::error::{SqlError, SqlResult};
use crate::ident::{self, Ident};
use serde::Deserialize;

/// A LEFT OUTER JOIN on a related table.
///
/// Exactly one of `via` or `join_constraints` must be set:
/// - `via`: `ON <via> = <alias>.<target_key>`. A bare `via` column belongs to
///   the primary table; `other.col` crosses an alias declared earlier.
/// - `join_constraints`: an ANDed constraint set; bare fields belong to the
///   joined table. It may reference the primary table, earlier aliases and
///   enclosing queries. An empty set counts as absent, and `target_key` is
///   rejected alongside it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinSpec {
    pub table: String,
    pub alias: String,
    #[serde(default)]
    pub via: Option<String>,
    #[serde(default)]
    pub join_constraints: Option<ConstraintMap>,
    /// Defaults to the configured identifier key.
    #[serde(default)]
    pub target_key: Option<String>,
}

impl JoinSpec {
    pub fn new(table: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            via: None,
            join_constraints: None,
            target_key: None,
        }
    }

    pub fn via(mut self, column: impl Into<String>) -> Self {
        self.via = Some(column.into());
        self
    }

    pub fn join_constraints(mut self, constraints: ConstraintMap) -> Self {
        self.join_constraints = Some(constraints);
        self
    }

    pub fn target_key(mut self, key: impl Into<String>) -> Self {
        self.target_key = Some(key.into());
        self
    }

    /// Compile into a join node. `earlier` holds the aliases declared before
    /// this one, the only ones a multi-hop `via` may cross.
    pub(super) fn compile(
        &self,
        ctx: Context<'_>,
        names: &Names<'_>,
        earlier: &[String],
        scope: &mut AliasScope,
        depth: usize,
    ) -> SqlResult<Join> {
        let table = TableRef::aliased(ident::validate(&self.table)?, &self.alias);

        let constraints = self.join_constraints.as_ref().filter(|c| !c.is_empty());
        let on = match (&self.via, constraints) {
            (Some(via), None) => {
                let left = match Ident::parse(via)?.into_parts() {
                    (None, name) => ColumnRef::qualified(names.primary(), name),
                    (Some(q), name) if q == names.primary() || earlier.contains(&q) => {
                        ColumnRef::qualified(q, name)
                    }
                    (Some(q), _) => return Err(SqlError::UnknownAlias(q)),
                };
                let key = self
                    .target_key
                    .as_deref()
                    .unwrap_or(&ctx.config.identifier_key);
                let right = ColumnRef::qualified(&self.alias, ident::validate(key)?);
                Expr::eq(Expr::column(left), Expr::column(right))
            }
            (None, Some(constraints)) => {
                if self.target_key.is_some() {
                    return Err(SqlError::invalid_value(
                        &self.alias,
                        "targetKey only applies to via joins",
                    ));
                }
                // Later joins are not in scope yet inside this ON clause.
                let visible = Names {
                    primary: names.primary.clone(),
                    aliases: earlier
                        .iter()
                        .cloned()
                        .chain(std::iter::once(self.alias.clone()))
                        .collect(),
                    parent: names.parent,
                };
                let cond = filter::compile(ctx, &visible, &self.alias, constraints, scope, depth)?;
                Expr::group(cond.unwrap_or(Expr::True))
            }
            _ => return Err(SqlError::MissingJoinKey(self.alias.clone())),
        };

        Ok(Join { table, on })
    }
}
