//! Serializes statement nodes into SQL text.
//!
//! Every identifier goes through [`Escaper::quote_identifier`] and every
//! literal through [`Escaper::escape`]; the renderer itself only emits
//! keywords and punctuation.

use super::{
    AlterOp, AlterTable, AssignValue, Assignment, ColumnDef, ColumnRef, CreateTable, Delete,
    DropTable, Expr, Insert, Join, Limit, OrderBy, OrderDir, Projection, Select, Statement,
    TableRef, Update,
};
use crate::error::SqlResult;
use crate::escape::Escaper;
use serde_json::Value;

/// A trait for any node that can be rendered into SQL.
pub trait Render {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()>;
}

/// Holds the output buffer and the escaper while rendering.
pub struct Renderer<'a> {
    pub sql: String,
    escaper: &'a dyn Escaper,
}

impl<'a> Renderer<'a> {
    pub fn new(escaper: &'a dyn Escaper) -> Self {
        Self {
            sql: String::new(),
            escaper,
        }
    }

    /// Consumes the renderer and returns the SQL text.
    pub fn finish(self) -> String {
        self.sql
    }

    pub fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub fn ident(&mut self, name: &str) -> SqlResult<()> {
        let quoted = self.escaper.quote_identifier(name)?;
        self.sql.push_str(&quoted);
        Ok(())
    }

    pub fn literal(&mut self, value: &Value) -> SqlResult<()> {
        let escaped = self.escaper.escape(value)?;
        self.sql.push_str(&escaped);
        Ok(())
    }

    fn list<T>(
        &mut self,
        items: &[T],
        mut each: impl FnMut(&mut Self, &T) -> SqlResult<()>,
    ) -> SqlResult<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            each(self, item)?;
        }
        Ok(())
    }
}

/// Render a node into a SQL string.
pub fn to_sql(node: &impl Render, escaper: &dyn Escaper) -> SqlResult<String> {
    let mut r = Renderer::new(escaper);
    node.render(&mut r)?;
    Ok(r.finish())
}

impl Render for TableRef {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.ident(&self.name)?;
        if let Some(alias) = &self.alias {
            r.push(" AS ");
            r.ident(alias)?;
        }
        Ok(())
    }
}

impl Render for ColumnRef {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        if let Some(q) = &self.qualifier {
            r.ident(q)?;
            r.push(".");
        }
        r.ident(&self.name)
    }
}

impl Render for Expr {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        match self {
            Expr::Column(col) => col.render(r),
            Expr::Concat(cols) => {
                r.push("CONCAT(");
                r.list(cols, |r, c| c.render(r))?;
                r.push(")");
                Ok(())
            }
            Expr::Literal(v) => r.literal(v),
            Expr::Compare { left, op, right } => {
                left.render(r)?;
                r.push(" ");
                r.push(op.as_sql());
                r.push(" ");
                right.render(r)
            }
            Expr::Like { expr, pattern } => {
                expr.render(r)?;
                r.push(" LIKE ");
                r.literal(&Value::String(pattern.clone()))
            }
            Expr::NullCheck { expr, is_null } => {
                expr.render(r)?;
                r.push(if *is_null { " IS NULL" } else { " IS NOT NULL" });
                Ok(())
            }
            Expr::InList {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    r.push("1=1");
                    return Ok(());
                }
                expr.render(r)?;
                r.push(if *negated { " NOT IN (" } else { " IN (" });
                r.list(values, |r, v| r.literal(v))?;
                r.push(")");
                Ok(())
            }
            Expr::InSubquery {
                expr,
                query,
                negated,
            } => {
                expr.render(r)?;
                r.push(if *negated { " NOT IN (" } else { " IN (" });
                query.render(r)?;
                r.push(")");
                Ok(())
            }
            Expr::And(exprs) => {
                if exprs.is_empty() {
                    r.push("1=1");
                    return Ok(());
                }
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        r.push(" AND ");
                    }
                    e.render(r)?;
                }
                Ok(())
            }
            Expr::Group(inner) => {
                r.push("(");
                inner.render(r)?;
                r.push(")");
                Ok(())
            }
            Expr::True => {
                r.push("1=1");
                Ok(())
            }
        }
    }
}

impl Render for Join {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("LEFT OUTER JOIN ");
        self.table.render(r)?;
        r.push(" ON ");
        self.on.render(r)
    }
}

impl Render for OrderBy {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        self.column.render(r)?;
        r.push(match self.direction {
            OrderDir::Asc => " ASC",
            OrderDir::Desc => " DESC",
        });
        Ok(())
    }
}

impl Render for Limit {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        match (self.skip, self.count) {
            (Some(skip), Some(count)) => r.push(&format!("LIMIT {skip}, {count}")),
            // Offset without a count keeps the historical `LIMIT skip, 0`.
            (Some(skip), None) => r.push(&format!("LIMIT {skip}, 0")),
            (None, Some(count)) => r.push(&format!("LIMIT {count}")),
            (None, None) => {}
        }
        Ok(())
    }
}

impl Render for Select {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("SELECT ");
        match &self.projection {
            Projection::All => r.push("*"),
            Projection::Columns(items) => r.list(items, |r, item| {
                item.source.render(r)?;
                if let Some(alias) = &item.alias {
                    r.push(" AS ");
                    r.ident(alias)?;
                }
                Ok(())
            })?,
            Projection::Count(alias) => {
                r.push("COUNT(*) AS ");
                r.ident(alias)?;
            }
        }

        r.push(" FROM ");
        self.from.render(r)?;

        for join in &self.joins {
            r.push(" ");
            join.render(r)?;
        }

        if let Some(where_clause) = &self.where_clause {
            r.push(" WHERE ");
            where_clause.render(r)?;
        }

        if !self.order_by.is_empty() {
            r.push(" ORDER BY ");
            r.list(&self.order_by, |r, o| o.render(r))?;
        }

        if !self.limit.is_empty() {
            r.push(" ");
            self.limit.render(r)?;
        }
        Ok(())
    }
}

impl Render for Assignment {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.ident(&self.column)?;
        r.push(" = ");
        match &self.value {
            AssignValue::Literal(v) => r.literal(v),
            AssignValue::Increment(delta) => {
                r.ident(&self.column)?;
                r.push(&format!(" + ({delta})"));
                Ok(())
            }
            AssignValue::Inserted => {
                r.push("VALUES(");
                r.ident(&self.column)?;
                r.push(")");
                Ok(())
            }
            AssignValue::Unchanged => r.ident(&self.column),
        }
    }
}

impl Render for Insert {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("INSERT INTO ");
        r.ident(&self.table)?;
        r.push(" (");
        r.list(&self.columns, |r, c| r.ident(c))?;
        r.push(") VALUES (");
        r.list(&self.values, |r, v| r.literal(v))?;
        r.push(")");

        if !self.on_duplicate.is_empty() {
            r.push(" ON DUPLICATE KEY UPDATE ");
            r.list(&self.on_duplicate, |r, a| a.render(r))?;
        }
        Ok(())
    }
}

impl Render for Update {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("UPDATE ");
        r.ident(&self.table)?;
        r.push(" SET ");
        r.list(&self.set, |r, a| a.render(r))?;
        r.push(" WHERE ");
        self.where_clause.render(r)
    }
}

impl Render for Delete {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("DELETE FROM ");
        r.ident(&self.table)?;
        r.push(" WHERE ");
        self.where_clause.render(r)
    }
}

impl Render for ColumnDef {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.ident(&self.name)?;
        r.push(" ");
        r.push(&self.sql_type);
        if self.not_null {
            r.push(" NOT NULL");
        }
        if self.auto_increment {
            r.push(" AUTO_INCREMENT");
        }
        if self.primary_key {
            r.push(" PRIMARY KEY");
        }
        Ok(())
    }
}

fn render_unique(r: &mut Renderer<'_>, columns: &[String]) -> SqlResult<()> {
    r.push("UNIQUE (");
    r.list(columns, |r, c| r.ident(c))?;
    r.push(")");
    Ok(())
}

impl Render for CreateTable {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("CREATE TABLE ");
        if self.if_not_exists {
            r.push("IF NOT EXISTS ");
        }
        r.ident(&self.table)?;
        r.push(" (");
        r.list(&self.columns, |r, c| c.render(r))?;
        if !self.unique.is_empty() {
            r.push(", ");
            render_unique(r, &self.unique)?;
        }
        r.push(")");
        Ok(())
    }
}

impl Render for AlterOp {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        match self {
            AlterOp::Add(def) => {
                r.push("ADD ");
                def.render(r)
            }
            AlterOp::Modify(def) => {
                r.push("MODIFY ");
                def.render(r)
            }
            AlterOp::Drop(name) => {
                r.push("DROP COLUMN ");
                r.ident(name)
            }
            AlterOp::Change { from, def } => {
                r.push("CHANGE COLUMN ");
                r.ident(from)?;
                r.push(" ");
                def.render(r)
            }
            AlterOp::AddUnique(columns) => {
                r.push("ADD ");
                render_unique(r, columns)
            }
        }
    }
}

impl Render for AlterTable {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("ALTER TABLE ");
        r.ident(&self.table)?;
        r.push(" ");
        r.list(&self.ops, |r, op| op.render(r))
    }
}

impl Render for DropTable {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        r.push("DROP TABLE ");
        if self.if_exists {
            r.push("IF EXISTS ");
        }
        r.ident(&self.table)
    }
}

impl Render for Statement {
    fn render(&self, r: &mut Renderer<'_>) -> SqlResult<()> {
        match self {
            Statement::Select(s) => s.render(r),
            Statement::Insert(s) => s.render(r),
            Statement::Update(s) => s.render(r),
            Statement::Delete(s) => s.render(r),
            Statement::CreateTable(s) => s.render(r),
            Statement::AlterTable(s) => s.render(r),
            Statement::DropTable(s) => s.render(r),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CompareOp, SelectItem};
    use crate::escape::MySqlEscaper;
    use serde_json::json;

    fn render(node: &impl Render) -> String {
        to_sql(node, &MySqlEscaper).unwrap()
    }

    fn col(q: &str, n: &str) -> ColumnRef {
        ColumnRef::qualified(q, n)
    }

    #[test]
    fn select_star() {
        let ast = Select::from(TableRef::new("users"));
        assert_eq!(render(&ast), "SELECT * FROM `users`");
    }

    #[test]
    fn select_with_every_clause() {
        let mut ast = Select::from(TableRef::new("pets"));
        ast.projection = Projection::Columns(vec![
            SelectItem {
                source: col("pets", "name"),
                alias: Some("name".into()),
            },
            SelectItem {
                source: col("owner", "name"),
                alias: Some("owner_name".into()),
            },
        ]);
        ast.joins.push(Join {
            table: TableRef::aliased("owners", "owner"),
            on: Expr::eq(
                Expr::column(col("pets", "owner_id")),
                Expr::column(col("owner", "id")),
            ),
        });
        ast.where_clause = Some(Expr::compare(
            Expr::column(col("pets", "age")),
            CompareOp::Gt,
            Expr::Literal(json!(2)),
        ));
        ast.order_by.push(OrderBy {
            column: col("pets", "name"),
            direction: OrderDir::Desc,
        });
        ast.limit = Limit {
            skip: Some(10),
            count: Some(5),
        };

        assert_eq!(
            render(&ast),
            "SELECT `pets`.`name` AS `name`, `owner`.`name` AS `owner_name` FROM `pets` \
             LEFT OUTER JOIN `owners` AS `owner` ON `pets`.`owner_id` = `owner`.`id` \
             WHERE `pets`.`age` > 2 ORDER BY `pets`.`name` DESC LIMIT 10, 5"
        );
    }

    #[test]
    fn limit_forms() {
        let render_limit = |skip, count| render(&Limit { skip, count });
        assert_eq!(render_limit(Some(3), Some(7)), "LIMIT 3, 7");
        assert_eq!(render_limit(Some(3), None), "LIMIT 3, 0");
        assert_eq!(render_limit(None, Some(7)), "LIMIT 7");
        assert_eq!(render_limit(None, None), "");
    }

    #[test]
    fn empty_in_list_is_tautology() {
        let e = Expr::InList {
            expr: Box::new(Expr::column(ColumnRef::new("id"))),
            values: vec![],
            negated: false,
        };
        assert_eq!(render(&e), "1=1");
        assert_eq!(render(&Expr::And(vec![])), "1=1");
    }

    #[test]
    fn grouped_and() {
        let e = Expr::group(Expr::And(vec![
            Expr::NullCheck {
                expr: Box::new(Expr::column(col("a", "x"))),
                is_null: true,
            },
            Expr::Like {
                expr: Box::new(Expr::Concat(vec![col("a", "f"), col("a", "l")])),
                pattern: "%bo%".into(),
            },
        ]));
        assert_eq!(
            render(&e),
            "(`a`.`x` IS NULL AND CONCAT(`a`.`f`, `a`.`l`) LIKE '%bo%')"
        );
    }

    #[test]
    fn insert_with_on_duplicate() {
        let ast = Insert {
            table: "widgets".into(),
            columns: vec!["id".into(), "name".into(), "hits".into()],
            values: vec![json!(1), json!("a"), json!(2)],
            on_duplicate: vec![
                Assignment {
                    column: "name".into(),
                    value: AssignValue::Inserted,
                },
                Assignment {
                    column: "hits".into(),
                    value: AssignValue::Increment(2),
                },
            ],
        };
        assert_eq!(
            render(&ast),
            "INSERT INTO `widgets` (`id`, `name`, `hits`) VALUES (1, 'a', 2) \
             ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `hits` = `hits` + (2)"
        );
    }

    #[test]
    fn ddl_nodes() {
        let def = ColumnDef {
            name: "id".into(),
            sql_type: "INT(11)".into(),
            not_null: true,
            auto_increment: true,
            primary_key: true,
        };
        let create = CreateTable {
            table: "t".into(),
            if_not_exists: true,
            columns: vec![def.clone()],
            unique: vec!["id".into()],
        };
        assert_eq!(
            render(&create),
            "CREATE TABLE IF NOT EXISTS `t` (`id` INT(11) NOT NULL AUTO_INCREMENT PRIMARY KEY, UNIQUE (`id`))"
        );

        let alter = AlterTable {
            table: "t".into(),
            ops: vec![
                AlterOp::Drop("old".into()),
                AlterOp::Change {
                    from: "a".into(),
                    def: ColumnDef {
                        name: "b".into(),
                        sql_type: "TEXT".into(),
                        not_null: false,
                        auto_increment: false,
                        primary_key: false,
                    },
                },
            ],
        };
        assert_eq!(
            render(&alter),
            "ALTER TABLE `t` DROP COLUMN `old`, CHANGE COLUMN `a` `b` TEXT"
        );

        let drop = DropTable {
            table: "t".into(),
            if_exists: true,
        };
        assert_eq!(render(&drop), "DROP TABLE IF EXISTS `t`");
    }
}
