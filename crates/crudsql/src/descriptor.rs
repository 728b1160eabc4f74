//! Whole-statement descriptors.
//!
//! Model layers (and the CLI) that prefer to hand over one JSON document per
//! statement deserialize one of these and turn it into a builder.
//!
//! ```
//! use crudsql::{MySqlEscaper, ReadDescriptor, SqlCompiler};
//!
//! let desc: ReadDescriptor = serde_json::from_str(r#"{
//!     "table": "pets",
//!     "select": ["name"],
//!     "where": {"age": {"gt": 2}},
//!     "sort": [{"field": "name", "direction": "desc"}],
//!     "limit": 10
//! }"#)?;
//!
//! let compiler = SqlCompiler::new(MySqlEscaper);
//! let sql = desc.into_builder(compiler.context()).find()?;
//! assert_eq!(
//!     sql,
//!     "SELECT `pets`.`name` AS `name` FROM `pets` WHERE `pets`.`age` > 2 \
//!      ORDER BY `pets`.`name` DESC LIMIT 10"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::Context;
use crate::constraint::ConstraintMap;
use crate::field::{AlterField, FieldDefinition};
use crate::ordered;
use crate::read::{FieldSelection, JoinSpec, ReadBuilder, SortSpec};
use crate::schema::SchemaBuilder;
use crate::write::{WriteBuilder, WriteValue};
use serde::Deserialize;
use serde_json::Value;

/// A SELECT: `{table, select?, joins?, where?, sort?, skip?, limit?}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReadDescriptor {
    pub table: String,
    #[serde(default)]
    pub select: Vec<FieldSelection>,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    #[serde(default, rename = "where")]
    pub where_clause: ConstraintMap,
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

impl ReadDescriptor {
    pub fn into_builder(self, ctx: Context<'_>) -> ReadBuilder<'_> {
        let mut builder = ReadBuilder::new(ctx, self.table)
            .select_all(self.select)
            .constraints(self.where_clause);
        for join in self.joins {
            builder = builder.join(join);
        }
        for spec in self.sort {
            builder = builder.sort(spec);
        }
        if let Some(skip) = self.skip {
            builder = builder.skip(skip);
        }
        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        builder
    }
}

/// A row change: `{table, id?, fields?, exclude?}`.
///
/// `exclude` lists the fields an upsert must not overwrite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriteDescriptor {
    pub table: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "ordered::entries")]
    pub fields: Vec<(String, WriteValue)>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl WriteDescriptor {
    pub fn into_builder(self, ctx: Context<'_>) -> WriteBuilder<'_> {
        let mut builder = WriteBuilder::new(ctx, self.table).values(self.fields);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        builder
    }
}

/// A DDL change: `{table, fields?, alter?}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDescriptor {
    pub table: String,
    #[serde(default, deserialize_with = "ordered::entries")]
    pub fields: Vec<(String, FieldDefinition)>,
    #[serde(default, deserialize_with = "ordered::entries")]
    pub alter: Vec<(String, AlterField)>,
}

impl SchemaDescriptor {
    pub fn into_builder(self, ctx: Context<'_>) -> SchemaBuilder<'_> {
        SchemaBuilder::new(ctx, self.table)
            .fields(self.fields)
            .alter_fields(self.alter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MySqlEscaper, SqlCompiler, SqlError};
    use serde_json::json;

    #[test]
    fn read_descriptor_with_joins_and_subquery() {
        let desc: ReadDescriptor = serde_json::from_value(json!({
            "table": "pets",
            "select": ["name", {"joinAlias": "owner", "field": "name", "as": "owner"}],
            "joins": [{"table": "owners", "alias": "owner", "via": "owner_id", "targetKey": "id"}],
            "where": {"owner_id": {"fi": {"table": "owners", "select": "id", "where": {"vip": {"eq": true}}}}}
        }))
        .unwrap();

        let c = SqlCompiler::new(MySqlEscaper);
        let sql = desc.into_builder(c.context()).find().unwrap();
        assert_eq!(
            sql,
            "SELECT `pets`.`name` AS `name`, `owner`.`name` AS `owner` FROM `pets` \
             LEFT OUTER JOIN `owners` AS `owner` ON `pets`.`owner_id` = `owner`.`id` \
             WHERE `pets`.`owner_id` IN (SELECT `sq1_0`.`id` FROM `owners` AS `sq1_0` \
             WHERE `sq1_0`.`vip` = true)"
        );
    }

    #[test]
    fn read_descriptor_rejects_unknown_operator() {
        let err = serde_json::from_value::<ReadDescriptor>(json!({
            "table": "pets",
            "where": {"name": {"like": "a%"}}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Unknown operator: like"));
    }

    #[test]
    fn write_descriptor_keeps_field_order() {
        let desc: WriteDescriptor = serde_json::from_value(json!({
            "table": "counters",
            "id": 4,
            "fields": {"zeta": "z", "hits": {"__op": "Increment", "amount": 2}, "alpha": 1}
        }))
        .unwrap();

        let c = SqlCompiler::new(MySqlEscaper);
        let sql = desc.into_builder(c.context()).update().unwrap();
        assert_eq!(
            sql,
            "UPDATE `counters` SET `zeta` = 'z', `hits` = `hits` + (2), `alpha` = 1 WHERE `id` = 4"
        );
    }

    #[test]
    fn schema_descriptor_create_and_alter() {
        let desc: SchemaDescriptor = serde_json::from_value(json!({
            "table": "widgets",
            "fields": {
                "name": {"type": "string"},
                "price": {"type": "money", "size": "10,2", "addons": ["required"]}
            },
            "alter": {
                "old": {"action": "drop"}
            }
        }))
        .unwrap();

        let c = SqlCompiler::new(MySqlEscaper);
        let builder = desc.into_builder(c.context());
        assert_eq!(
            builder.create().unwrap(),
            "CREATE TABLE `widgets` (`name` VARCHAR(30), `price` FLOAT(10,2) NOT NULL)"
        );
        assert_eq!(builder.alter().unwrap(), "ALTER TABLE `widgets` DROP COLUMN `old`");
    }

    #[test]
    fn descriptor_errors_convert() {
        let err: SqlError = serde_json::from_str::<SchemaDescriptor>("{\"table\": 1}")
            .unwrap_err()
            .into();
        assert!(matches!(err, SqlError::Descriptor(_)));
        assert!(err.to_string().starts_with("Invalid descriptor: invalid type"));
    }
}
