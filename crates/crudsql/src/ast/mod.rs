//! Typed statement nodes.
//!
//! Builders translate descriptors into these nodes; [`render`] turns them into
//! SQL text. Nothing in here knows about descriptors, and nothing outside
//! `render` knows about whitespace or quoting.

mod alias;
pub mod render;

pub use alias::AliasScope;
pub use render::{Render, Renderer, to_sql};

use serde_json::Value;

/// A table in a FROM or JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name other clauses use to refer to this table.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A column, e.g. `name` or `owner.name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::GtEq => ">=",
            CompareOp::Lt => "<",
            CompareOp::LtEq => "<=",
        }
    }
}

/// Expression node for WHERE and ON clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `qualifier.column`
    Column(ColumnRef),

    /// `CONCAT(a, b, ...)`
    Concat(Vec<ColumnRef>),

    /// Escaped literal.
    Literal(Value),

    /// `left <op> right`
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },

    /// `expr LIKE 'pattern'`
    Like { expr: Box<Expr>, pattern: String },

    /// `expr IS NULL` / `expr IS NOT NULL`
    NullCheck { expr: Box<Expr>, is_null: bool },

    /// `expr IN (v1, v2, ...)` / `NOT IN`. Never empty; see [`Expr::in_list`].
    InList {
        expr: Box<Expr>,
        values: Vec<Value>,
        negated: bool,
    },

    /// `expr IN (SELECT ...)` / `NOT IN`
    InSubquery {
        expr: Box<Expr>,
        query: Box<Select>,
        negated: bool,
    },

    /// All conditions must hold. Empty renders as `1=1`.
    And(Vec<Expr>),

    /// Parenthesized expression.
    Group(Box<Expr>),

    /// `1=1`
    True,
}

impl Expr {
    pub fn column(col: ColumnRef) -> Self {
        Expr::Column(col)
    }

    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(left: Expr, right: Expr) -> Self {
        Self::compare(left, CompareOp::Eq, right)
    }

    /// IN / NOT IN over a list; an empty list collapses to `1=1`.
    pub fn in_list(expr: Expr, values: Vec<Value>, negated: bool) -> Self {
        if values.is_empty() {
            return Expr::True;
        }
        Expr::InList {
            expr: Box::new(expr),
            values,
            negated,
        }
    }

    /// AND the given conditions, flattening single-element groups.
    pub fn and(mut exprs: Vec<Expr>) -> Self {
        if exprs.len() == 1 {
            return exprs.remove(0);
        }
        Expr::And(exprs)
    }

    pub fn group(expr: Expr) -> Self {
        Expr::Group(Box::new(expr))
    }
}

/// What a SELECT returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Projection {
    /// `*`
    #[default]
    All,
    /// `source AS alias, ...`
    Columns(Vec<SelectItem>),
    /// `COUNT(*) AS alias`
    Count(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub source: ColumnRef,
    pub alias: Option<String>,
}

/// `LEFT OUTER JOIN table AS alias ON ...`
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub on: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDir {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: ColumnRef,
    pub direction: OrderDir,
}

/// MySQL `LIMIT [skip,] count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limit {
    pub skip: Option<u64>,
    pub count: Option<u64>,
}

impl Limit {
    pub fn is_empty(&self) -> bool {
        self.skip.is_none() && self.count.is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub projection: Projection,
    pub from: TableRef,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub order_by: Vec<OrderBy>,
    pub limit: Limit,
}

impl Select {
    pub fn from(table: TableRef) -> Self {
        Self {
            projection: Projection::All,
            from: table,
            joins: Vec::new(),
            where_clause: None,
            order_by: Vec::new(),
            limit: Limit::default(),
        }
    }
}

/// Right-hand side of `column = ...` in UPDATE or ON DUPLICATE KEY UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignValue {
    /// Escaped literal.
    Literal(Value),
    /// `column + (delta)`; the delta is a validated integer, not data.
    Increment(i64),
    /// `VALUES(column)`: the value the INSERT half tried to write.
    Inserted,
    /// `column`: leave unchanged.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: AssignValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
    pub on_duplicate: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: String,
    pub set: Vec<Assignment>,
    pub where_clause: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: String,
    pub where_clause: Expr,
}

/// One column in CREATE TABLE or ALTER TABLE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: String,
    pub not_null: bool,
    pub auto_increment: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub table: String,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDef>,
    pub unique: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterOp {
    Add(ColumnDef),
    Modify(ColumnDef),
    Drop(String),
    Change { from: String, def: ColumnDef },
    AddUnique(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTable {
    pub table: String,
    pub ops: Vec<AlterOp>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    pub table: String,
    pub if_exists: bool,
}

/// Any compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    CreateTable(CreateTable),
    AlterTable(AlterTable),
    DropTable(DropTable),
}
