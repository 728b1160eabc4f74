//! # crudsql
//!
//! Compiles CRUD descriptors into MySQL statements.
//!
//! ## Features
//!
//! - **Three builders**: [`ReadBuilder`] (SELECT with joins, constraints and
//!   subqueries), [`WriteBuilder`] (INSERT / UPDATE / DELETE / upsert) and
//!   [`SchemaBuilder`] (CREATE / ALTER / DROP TABLE)
//! - **No string splicing**: builders produce a typed statement tree that one
//!   renderer serializes; every identifier is validated and quoted, every
//!   value escaped by the injected [`Escaper`]
//! - **No globals**: the escaper and [`CompilerConfig`] travel with the
//!   [`SqlCompiler`] that hands out builders
//! - **Adapter boundary**: [`Adapter`] runs statements; failures surface as
//!   [`SqlError::QueryFailed`] with the statement text kept
//!
//! ## Usage
//!
//! ```
//! use crudsql::{Constraint, MySqlEscaper, SqlCompiler};
//! use serde_json::json;
//!
//! let compiler = SqlCompiler::new(MySqlEscaper);
//!
//! let select = compiler
//!     .read("users")
//!     .filter("status", Constraint::In(vec![json!("active"), json!("trial")]))
//!     .limit(10)
//!     .find()?;
//! assert_eq!(
//!     select,
//!     "SELECT * FROM `users` WHERE `users`.`status` IN ('active', 'trial') LIMIT 10"
//! );
//!
//! let update = compiler
//!     .write("users")
//!     .id(1)
//!     .set("status", "inactive")
//!     .increment("logins", 1)
//!     .update()?;
//! assert_eq!(
//!     update,
//!     "UPDATE `users` SET `status` = 'inactive', `logins` = `logins` + (1) WHERE `id` = 1"
//! );
//! # Ok::<(), crudsql::SqlError>(())
//! ```

pub mod adapter;
pub mod ast;
mod compiler;
pub mod config;
pub mod constraint;
pub mod descriptor;
pub mod error;
pub mod escape;
pub mod field;
pub mod ident;
mod ordered;
pub mod read;
pub mod schema;
pub mod write;

pub use adapter::{Adapter, ExecResult, Row, StatementKind, execute, fetch_all, fetch_first};
pub use compiler::{Context, SqlCompiler};
pub use config::CompilerConfig;
pub use constraint::{Constraint, ConstraintMap, Operator, SubqueryDescriptor};
pub use descriptor::{ReadDescriptor, SchemaDescriptor, WriteDescriptor};
pub use error::{AdapterError, SqlError, SqlResult};
pub use escape::{Escaper, MySqlEscaper};
pub use field::{Addon, AlterAction, AlterField, ColumnSize, FieldDefinition, FieldType};
pub use ident::Ident;
pub use read::{FieldSelection, JoinSpec, ReadBuilder, SortDirection, SortSpec};
pub use schema::SchemaBuilder;
pub use write::{WriteBuilder, WriteValue};
