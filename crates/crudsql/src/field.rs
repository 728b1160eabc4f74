//! Column definitions for schema statements.

use crate::ast::ColumnDef;
use crate::error::{SqlError, SqlResult};
use serde::Deserialize;
use std::fmt;

/// Semantic column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Email,
    Password,
    Text,
    Integer,
    Pointer,
    Float,
    Money,
    Geopoint,
    Datetime,
    Acl,
}

impl FieldType {
    /// Concrete MySQL type name and its default size.
    fn mysql(self) -> (&'static str, Option<ColumnSize>) {
        use ColumnSize::{Length, Precision};
        match self {
            FieldType::String => ("VARCHAR", Some(Length(30))),
            FieldType::Email => ("VARCHAR", Some(Length(60))),
            FieldType::Password => ("VARCHAR", Some(Length(250))),
            FieldType::Text | FieldType::Acl => ("TEXT", None),
            FieldType::Integer | FieldType::Pointer => ("INT", Some(Length(11))),
            FieldType::Float | FieldType::Money => ("FLOAT", Some(Precision(14, 2))),
            FieldType::Geopoint => ("FLOAT", Some(Precision(12, 8))),
            FieldType::Datetime => ("DATETIME", None),
        }
    }
}

/// Column size: `(30)` or `(14,2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSize {
    Length(u32),
    Precision(u32, u32),
}

impl fmt::Display for ColumnSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnSize::Length(n) => write!(f, "({n})"),
            ColumnSize::Precision(p, s) => write!(f, "({p},{s})"),
        }
    }
}

impl std::str::FromStr for ColumnSize {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        let bad = || SqlError::invalid_value("size", format!("expected N or P,S, got '{s}'"));
        match s.split_once(',') {
            None => s.trim().parse().map(ColumnSize::Length).map_err(|_| bad()),
            Some((p, scale)) => {
                let p = p.trim().parse().map_err(|_| bad())?;
                let scale = scale.trim().parse().map_err(|_| bad())?;
                Ok(ColumnSize::Precision(p, scale))
            }
        }
    }
}

impl<'de> Deserialize<'de> for ColumnSize {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Length(u32),
            Pair([u32; 2]),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Length(n) => Ok(ColumnSize::Length(n)),
            Raw::Pair([p, s]) => Ok(ColumnSize::Precision(p, s)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Column constraint flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Addon {
    /// `PRIMARY KEY`, implies NOT NULL
    Primary,
    /// `AUTO_INCREMENT`
    Increment,
    /// Collected into one table-level `UNIQUE (...)`
    Unique,
    /// `NOT NULL`
    Required,
}

/// A column's semantic type, optional size override and addons.
///
/// ```
/// use crudsql::{Addon, FieldDefinition, FieldType};
///
/// let def = FieldDefinition::new(FieldType::Money).addon(Addon::Required);
/// assert_eq!(def.sql_type(), "FLOAT(14,2)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDefinition {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub size: Option<ColumnSize>,
    #[serde(default)]
    pub addons: Vec<Addon>,
}

impl FieldDefinition {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            size: None,
            addons: Vec::new(),
        }
    }

    pub fn size(mut self, size: ColumnSize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn addon(mut self, addon: Addon) -> Self {
        if !self.addons.contains(&addon) {
            self.addons.push(addon);
        }
        self
    }

    pub fn has(&self, addon: Addon) -> bool {
        self.addons.contains(&addon)
    }

    /// Concrete column type; an explicit size always wins over the default.
    pub fn sql_type(&self) -> String {
        let (name, default_size) = self.field_type.mysql();
        match self.size.or(default_size) {
            Some(size) => format!("{name}{size}"),
            None => name.to_string(),
        }
    }

    pub(crate) fn column_def(&self, name: &str) -> ColumnDef {
        let primary = self.has(Addon::Primary);
        ColumnDef {
            name: name.to_string(),
            sql_type: self.sql_type(),
            not_null: primary || self.has(Addon::Required),
            auto_increment: self.has(Addon::Increment),
            primary_key: primary,
        }
    }
}

/// What ALTER TABLE does with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlterAction {
    Add,
    Modify,
    Drop,
    Rename,
}

/// A field entry in an ALTER TABLE descriptor.
///
/// `drop` needs no definition; every other action does, and `rename` also
/// needs the new column name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawAlterField")]
pub struct AlterField {
    pub action: AlterAction,
    pub new_name: Option<String>,
    pub definition: Option<FieldDefinition>,
}

impl AlterField {
    pub fn add(definition: FieldDefinition) -> Self {
        Self {
            action: AlterAction::Add,
            new_name: None,
            definition: Some(definition),
        }
    }

    pub fn modify(definition: FieldDefinition) -> Self {
        Self {
            action: AlterAction::Modify,
            new_name: None,
            definition: Some(definition),
        }
    }

    pub fn drop() -> Self {
        Self {
            action: AlterAction::Drop,
            new_name: None,
            definition: None,
        }
    }

    pub fn rename(new_name: impl Into<String>, definition: FieldDefinition) -> Self {
        Self {
            action: AlterAction::Rename,
            new_name: Some(new_name.into()),
            definition: Some(definition),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawAlterField {
    action: AlterAction,
    #[serde(default)]
    new_name: Option<String>,
    #[serde(default, rename = "type")]
    field_type: Option<FieldType>,
    #[serde(default)]
    size: Option<ColumnSize>,
    #[serde(default)]
    addons: Vec<Addon>,
}

impl TryFrom<RawAlterField> for AlterField {
    type Error = String;

    fn try_from(raw: RawAlterField) -> Result<Self, Self::Error> {
        let definition = raw.field_type.map(|field_type| FieldDefinition {
            field_type,
            size: raw.size,
            addons: raw.addons,
        });
        match (raw.action, &raw.new_name, &definition) {
            (AlterAction::Drop, _, _) => {}
            (AlterAction::Rename, None, _) => return Err("rename requires newName".into()),
            (_, _, None) => return Err(format!("{:?} requires a type", raw.action)),
            _ => {}
        }
        Ok(Self {
            action: raw.action,
            new_name: raw.new_name,
            definition,
        })
    }
}
