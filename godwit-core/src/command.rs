//! The declarative command model.
//!
//! A migration program is a list of commands, each a mapping keyed by exactly
//! one dispatch key (`create-table`, `alter-table`, ...). serde's externally
//! tagged enum representation gives that shape natively, so migration files
//! deserialize straight into [`Command`].

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single declarative schema command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    CreateTable(CreateTable),
    DropTable(DropTable),
    AlterTable(AlterTable),
    CreateIndex(CreateIndex),
    DropIndex(DropIndex),
    InsertInto(InsertInto),
    Update(Update),
}

/// The supported dispatch keys, in declaration order.
pub const DISPATCH_KEYS: &[&str] = &[
    "create-table",
    "drop-table",
    "alter-table",
    "create-index",
    "drop-index",
    "insert-into",
    "update",
];

impl Command {
    /// Parse one command from a JSON value.
    ///
    /// The value must be a mapping with exactly one key, and that key must be
    /// a supported dispatch key.
    pub fn from_value(value: &serde_json::Value) -> Result<Command> {
        let map = value.as_object().ok_or_else(|| {
            Error::Validation("up/down must be a map or list of maps".to_string())
        })?;
        if map.len() != 1 {
            return Err(Error::Validation(format!(
                "command must carry exactly one dispatch key, found {}",
                map.len()
            )));
        }
        let key = map.keys().next().expect("len checked above");
        if !DISPATCH_KEYS.contains(&key.as_str()) {
            return Err(Error::UnknownCommand(key.clone()));
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    /// The dispatch key this command carries.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateTable(_) => "create-table",
            Command::DropTable(_) => "drop-table",
            Command::AlterTable(_) => "alter-table",
            Command::CreateIndex(_) => "create-index",
            Command::DropIndex(_) => "drop-index",
            Command::InsertInto(_) => "insert-into",
            Command::Update(_) => "update",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CreateTable {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    pub table_options: Vec<TableOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropTable {
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AlterTable {
    pub table: String,
    #[serde(default)]
    pub add_columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub drop_columns: Vec<String>,
    #[serde(default)]
    pub modify_columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub add_constraints: Vec<ConstraintSpec>,
    #[serde(default)]
    pub drop_constraints: Vec<String>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub table_options: Vec<TableOption>,
    #[serde(default)]
    pub character_set: Option<CharacterSet>,
}

/// Sentinel accepted in `drop-constraints` meaning "the primary key".
pub const PRIMARY_KEY_SENTINEL: &str = "primary-key";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIndex {
    pub index: String,
    pub on: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropIndex {
    pub index: String,
    pub on: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InsertInto {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
    #[serde(default)]
    pub query: Option<String>,
}

/// Raw UPDATE text, with optional per-backend overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub mysql: Option<String>,
    #[serde(default)]
    pub postgresql: Option<String>,
    #[serde(default)]
    pub h2: Option<String>,
    #[serde(default)]
    pub sqlserver: Option<String>,
}

impl Update {
    /// The override string for a backend, if present and non-empty.
    pub fn override_for(&self, backend: &str) -> Option<&str> {
        let text = match backend {
            "mysql" => self.mysql.as_deref(),
            "postgresql" => self.postgresql.as_deref(),
            "h2" => self.h2.as_deref(),
            "sqlserver" => self.sqlserver.as_deref(),
            _ => None,
        };
        text.filter(|t| !t.is_empty())
    }
}

/// A column definition: a name followed by free-form SQL fragment tokens.
///
/// Serialized as a JSON array `["name", "INT", "NOT NULL", ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub tokens: Vec<String>,
}

impl ColumnSpec {
    pub fn new<S: Into<String>>(name: S, tokens: &[&str]) -> Self {
        Self {
            name: name.into(),
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A named foreign-key constraint: the ref-specs form the tail of
/// `FOREIGN KEY (col) REFERENCES other(col) [on-rules]`.
///
/// Serialized as a JSON array `["fk_name", "(a) REFERENCES b(c)", ...]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    pub name: String,
    pub refs: Vec<String>,
}

impl ConstraintSpec {
    pub fn new<S: Into<String>>(name: S, refs: &[&str]) -> Self {
        Self {
            name: name.into(),
            refs: refs.iter().map(|r| r.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSet {
    pub name: String,
    #[serde(default)]
    pub collation: Option<String>,
}

/// A literal value in an `insert-into` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

fn head_and_tail<'de, A: SeqAccess<'de>>(
    mut seq: A,
    what: &'static str,
) -> std::result::Result<(String, Vec<String>), A::Error> {
    let name: String = seq
        .next_element()?
        .ok_or_else(|| de::Error::custom(format!("{what} needs a name")))?;
    let mut rest = Vec::new();
    while let Some(token) = seq.next_element::<String>()? {
        rest.push(token);
    }
    Ok((name, rest))
}

impl Serialize for ColumnSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1 + self.tokens.len()))?;
        seq.serialize_element(&self.name)?;
        for token in &self.tokens {
            seq.serialize_element(token)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ColumnSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ColumnVisitor;
        impl<'de> Visitor<'de> for ColumnVisitor {
            type Value = ColumnSpec;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a [name, tokens...] array")
            }
            fn visit_seq<A: SeqAccess<'de>>(
                self,
                seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let (name, tokens) = head_and_tail(seq, "column spec")?;
                Ok(ColumnSpec { name, tokens })
            }
        }
        deserializer.deserialize_seq(ColumnVisitor)
    }
}

impl Serialize for ConstraintSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1 + self.refs.len()))?;
        seq.serialize_element(&self.name)?;
        for r in &self.refs {
            seq.serialize_element(r)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ConstraintSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ConstraintVisitor;
        impl<'de> Visitor<'de> for ConstraintVisitor {
            type Value = ConstraintSpec;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a [name, ref-specs...] array")
            }
            fn visit_seq<A: SeqAccess<'de>>(
                self,
                seq: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let (name, refs) = head_and_tail(seq, "constraint spec")?;
                Ok(ConstraintSpec { name, refs })
            }
        }
        deserializer.deserialize_seq(ConstraintVisitor)
    }
}
