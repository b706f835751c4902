//! Collection schemas
//!
//! Schemas are long-lived and read-only during a compile. They are supplied
//! by the catalog and can be loaded from YAML:
//!
//! ```yaml
//! name: evidence
//! normal_form: 3NF
//! columns:
//!   - { name: id, type: Uuid, primary_key: true }
//!   - { name: prompt_provenance, type: "BoundedNat(0, 100)" }
//! constraints: ["title unique per source"]
//! ```

use super::type_expr::TypeExpr;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema name must not be empty")]
    EmptyName,

    #[error("duplicate column '{column}' in schema '{schema}'")]
    DuplicateColumn { schema: String, column: String },

    #[error("schema '{0}' declares no columns")]
    NoColumns(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Database normal form classification (passed through, never computed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NormalForm {
    First,
    Second,
    Third,
    BoyceCodd,
}

impl NormalForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "1NF",
            Self::Second => "2NF",
            Self::Third => "3NF",
            Self::BoyceCodd => "BCNF",
        }
    }
}

impl fmt::Display for NormalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormalForm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "1NF" => Ok(Self::First),
            "2NF" => Ok(Self::Second),
            "3NF" => Ok(Self::Third),
            "BCNF" => Ok(Self::BoyceCodd),
            _ => Err(format!(
                "unknown normal form '{}' (expected 1NF, 2NF, 3NF or BCNF)",
                s
            )),
        }
    }
}

impl Serialize for NormalForm {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NormalForm {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default, rename = "primary_key")]
    pub is_primary_key: bool,
    #[serde(default, rename = "unique")]
    pub is_unique: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            is_primary_key: false,
            is_unique: false,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.is_unique = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }
}

#[derive(Deserialize)]
struct RawSchema {
    name: String,
    columns: Vec<ColumnDef>,
    #[serde(default)]
    constraints: Vec<String>,
    #[serde(default)]
    normal_form: Option<NormalForm>,
}

/// Collection schema with unique column names
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    name: String,
    columns: Vec<ColumnDef>,
    constraints: Vec<String>,
    normal_form: Option<NormalForm>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl Schema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self, SchemaError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if columns.is_empty() {
            return Err(SchemaError::NoColumns(name));
        }
        let mut index = FxHashMap::default();
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateColumn {
                    schema: name,
                    column: column.name.clone(),
                });
            }
        }
        Ok(Self {
            name,
            columns,
            constraints: Vec::new(),
            normal_form: None,
            index,
        })
    }

    pub fn with_constraints(mut self, constraints: Vec<String>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_normal_form(mut self, form: NormalForm) -> Self {
        self.normal_form = Some(form);
        self
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, SchemaError> {
        let raw: RawSchema = serde_yaml::from_str(text)?;
        let mut schema = Self::new(raw.name, raw.columns)?.with_constraints(raw.constraints);
        schema.normal_form = raw.normal_form;
        Ok(schema)
    }

    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn constraints(&self) -> &[String] {
        &self.constraints
    }

    pub fn normal_form(&self) -> Option<NormalForm> {
        self.normal_form
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns == other.columns
            && self.constraints == other.constraints
            && self.normal_form == other.normal_form
    }
}
