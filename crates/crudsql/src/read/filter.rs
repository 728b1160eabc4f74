//! Constraint maps to WHERE / ON predicates.

use super::{FieldSelection, Names, ReadBuilder};
use crate::Context;
use crate::ast::{AliasScope, CompareOp, Expr, Select};
use crate::constraint::{Constraint, ConstraintMap, SubqueryDescriptor};
use crate::error::SqlResult;
use crate::ident::Ident;
use crate::read::JoinSpec;

/// Compile `constraints` into one predicate, or `None` when there are none.
///
/// Bare field names are qualified with `qualifier`.
pub(super) fn compile(
    ctx: Context<'_>,
    names: &Names<'_>,
    qualifier: &str,
    constraints: &ConstraintMap,
    scope: &mut AliasScope,
    depth: usize,
) -> SqlResult<Option<Expr>> {
    let mut fields = Vec::with_capacity(constraints.len());
    for (field, list) in constraints.iter() {
        let mut parts = Vec::with_capacity(list.len());
        for constraint in list {
            parts.push(predicate(ctx, names, qualifier, field, constraint, scope, depth)?);
        }
        match parts.len() {
            0 => {}
            1 => fields.extend(parts),
            _ => fields.push(Expr::group(Expr::And(parts))),
        }
    }

    if fields.is_empty() {
        return Ok(None);
    }
    Ok(Some(Expr::and(fields)))
}

fn predicate(
    ctx: Context<'_>,
    names: &Names<'_>,
    qualifier: &str,
    field: &str,
    constraint: &Constraint,
    scope: &mut AliasScope,
    depth: usize,
) -> SqlResult<Expr> {
    let column = || names.column_in(qualifier, field).map(Expr::Column);
    let compare = |op, value: &serde_json::Value| -> SqlResult<Expr> {
        Ok(Expr::compare(column()?, op, Expr::Literal(value.clone())))
    };
    let like = |expr: Expr, pattern: String| Expr::Like {
        expr: Box::new(expr),
        pattern,
    };

    let expr = match constraint {
        Constraint::Eq(v) => compare(CompareOp::Eq, v)?,
        Constraint::Neq(v) => compare(CompareOp::NotEq, v)?,
        Constraint::Gt(v) => compare(CompareOp::Gt, v)?,
        Constraint::Gte(v) => compare(CompareOp::GtEq, v)?,
        Constraint::Lt(v) => compare(CompareOp::Lt, v)?,
        Constraint::Lte(v) => compare(CompareOp::LtEq, v)?,
        Constraint::StartsWith(s) => like(column()?, format!("{s}%")),
        Constraint::EndsWith(s) => like(column()?, format!("%{s}")),
        Constraint::Contains(s) => {
            let target = contains_target(ctx, names, qualifier, field)?;
            like(target, format!("%{s}%"))
        }
        Constraint::Exists(exists) => Expr::NullCheck {
            expr: Box::new(column()?),
            is_null: !exists,
        },
        Constraint::In(values) => Expr::in_list(column()?, values.clone(), false),
        Constraint::NotIn(values) => Expr::in_list(column()?, values.clone(), true),
        Constraint::InQuery(sub) | Constraint::NotInQuery(sub) => Expr::InSubquery {
            expr: Box::new(column()?),
            query: Box::new(subquery(ctx, names, sub, scope, depth)?),
            negated: matches!(constraint, Constraint::NotInQuery(_)),
        },
    };
    Ok(expr)
}

/// `has` keys may name several columns joined by the delimiter; each one is
/// validated like any other field before being concatenated.
fn contains_target(
    ctx: Context<'_>,
    names: &Names<'_>,
    qualifier: &str,
    field: &str,
) -> SqlResult<Expr> {
    let delimiter = ctx.config.has_delimiter;
    if !field.contains(delimiter) {
        return names.column_in(qualifier, field).map(Expr::Column);
    }
    let columns = field
        .split(delimiter)
        .map(|part| names.column_in(qualifier, part))
        .collect::<SqlResult<Vec<_>>>()?;
    Ok(Expr::Concat(columns))
}

/// Compile an `fi`/`nfi` descriptor as a one-column SELECT one level deeper.
fn subquery(
    ctx: Context<'_>,
    names: &Names<'_>,
    sub: &SubqueryDescriptor,
    scope: &mut AliasScope,
    depth: usize,
) -> SqlResult<Select> {
    let mut builder = ReadBuilder::new(ctx, &sub.table)
        .subquery(true)
        .select(FieldSelection::Field(sub.select.clone()))
        .constraints(sub.where_clause.clone());
    for join in &sub.joins {
        builder = builder.join(join.clone());
    }

    // A qualified select reads through a pointer column named after the alias.
    let selected = Ident::parse(&sub.select)?;
    if let Some(alias) = selected.qualifier()
        && !sub.joins.iter().any(|j| j.alias == alias)
    {
        builder = builder.join(
            JoinSpec::new(alias, alias)
                .via(alias)
                .target_key(&ctx.config.identifier_key),
        );
    }

    builder.skip = sub.skip;
    builder.limit = sub.limit;
    builder.compile(scope, Some(names), depth + 1)
}
