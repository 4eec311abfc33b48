//! SQL Server command compiler.
//!
//! Transact-SQL takes grouped ALTER clauses: all drops ride one
//! `ALTER TABLE t DROP CONSTRAINT n, COLUMN c` statement, all additions one
//! `ALTER TABLE t ADD ...` statement. Column types written for MySQL are
//! remapped token-by-token (`auto_increment` -> `identity`, `text` ->
//! `varchar(max)`, ...), with two pattern rewrites: `ENUM(...)` becomes a
//! VARCHAR with a CHECK constraint, and VARBINARY beyond the 8000-byte page
//! limit becomes `varbinary(max)`.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::warn;

use super::{
    addable_columns, addable_constraints, column_def, constraint_fragment, create_index_sql,
    create_table_sql, droppable_columns, droppable_constraints, expand_create_table,
    insert_into_sql, options_fragment, should_skip_create_index, should_skip_create_table,
    should_skip_drop_index, update_sql, ConstraintDrop, Dialect, StringStyle,
};
use crate::command::{AlterTable, ColumnSpec, Command, CreateIndex, CreateTable, DropIndex};
use crate::error::Result;
use crate::inspect::CompileContext;
use crate::names::sqlserver_name;

/// Table options SQL Server has no syntax for.
const IGNORED_OPTIONS: &[&str] = &["row_format"];

fn enum_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^ENUM\((.+)\)$").expect("enum regex"))
}

fn enum_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"'([^']*)'").expect("enum value regex"))
}

fn varbinary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^VARBINARY\((\d+)\)$").expect("varbinary regex"))
}

fn int_width_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^INT\(\d+\)$").expect("int width regex"))
}

fn tinyint_width_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^TINYINT\(\d+\)$").expect("tinyint width regex"))
}

fn charset_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(CHARACTER\s+SET|COLLATE)\b").expect("charset token regex"))
}

/// Rewrite one MySQL-flavored type token into Transact-SQL. Returns None
/// when the token should be dropped entirely.
fn remap_token(token: &str, column: &str) -> Option<String> {
    if charset_token_regex().is_match(token) {
        return None;
    }
    if let Some(caps) = enum_regex().captures(token) {
        let inner = caps.get(1).expect("enum body").as_str();
        let width = enum_value_regex()
            .captures_iter(inner)
            .map(|c| c.get(1).expect("enum value").as_str().len())
            .max()
            .unwrap_or(1);
        return Some(format!("VARCHAR({width}) CHECK ({column} IN({inner}))"));
    }
    if let Some(caps) = varbinary_regex().captures(token) {
        let width: u64 = caps
            .get(1)
            .expect("varbinary width")
            .as_str()
            .parse()
            .unwrap_or(0);
        if width > 8000 {
            return Some("varbinary(max)".to_string());
        }
        return Some(token.to_string());
    }
    if int_width_regex().is_match(token) {
        return Some("int".to_string());
    }
    if token.eq_ignore_ascii_case("tinyint(1)") {
        return Some("bit".to_string());
    }
    if tinyint_width_regex().is_match(token) {
        return Some("tinyint".to_string());
    }
    let mapped = match token.to_lowercase().as_str() {
        "auto_increment" => "identity",
        "blob" | "longblob" => "varbinary(max)",
        "boolean" => "bit",
        "text" | "longtext" | "mediumtext" | "shorttext" => "varchar(max)",
        "timestamp" => "datetime",
        "double" => "float",
        _ => return Some(token.to_string()),
    };
    Some(mapped.to_string())
}

#[derive(Debug, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    pub fn new() -> Self {
        Self
    }

    fn ident(&self, ident: &str) -> String {
        sqlserver_name(ident, true)
    }

    fn sanitize(&self, col: &ColumnSpec) -> ColumnSpec {
        let name = self.ident(&col.name);
        let tokens = col
            .tokens
            .iter()
            .filter_map(|t| remap_token(t, &name))
            .collect();
        ColumnSpec { name: col.name.clone(), tokens }
    }

    async fn create_table(&self, ct: &CreateTable, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_create_table(&ct.table, ctx).await? {
            return Ok(Vec::new());
        }
        if !ct.table_options.is_empty() {
            return expand_create_table(self, ct, ctx, &|n| self.ident(n)).await;
        }
        let columns: Vec<ColumnSpec> = ct.columns.iter().map(|c| self.sanitize(c)).collect();
        Ok(vec![create_table_sql(
            &ct.table,
            &columns,
            &ct.primary_key,
            &ct.constraints,
            &|n| self.ident(n),
        )])
    }

    async fn alter_table(&self, at: &AlterTable, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        let table = self.ident(&at.table);
        let name = |n: &str| self.ident(n);
        let mut statements = Vec::new();

        // drops ride one grouped statement
        let mut drop_items = Vec::new();
        for drop in droppable_constraints(&at.table, &at.drop_constraints, ctx).await? {
            match drop {
                ConstraintDrop::PrimaryKey => match ctx.primary_key_name(&at.table).await? {
                    Some(pk_name) => drop_items.push(format!("CONSTRAINT {}", name(&pk_name))),
                    None => {
                        warn!(table = %at.table, "cannot discover primary key name, skipping drop");
                    }
                },
                ConstraintDrop::ForeignKey(constraint) => {
                    drop_items.push(format!("CONSTRAINT {}", name(constraint)));
                }
            }
        }
        for column in droppable_columns(&at.table, &at.drop_columns, ctx).await? {
            drop_items.push(format!("COLUMN {}", name(column)));
        }
        if !drop_items.is_empty() {
            statements.push(format!("ALTER TABLE {table} DROP {}", drop_items.join(", ")));
        }

        // additions ride one grouped statement
        let mut add_items: Vec<String> = addable_columns(&at.table, &at.add_columns, ctx)
            .await?
            .into_iter()
            .map(|c| column_def(&self.sanitize(c), &name))
            .collect();
        for spec in addable_constraints(&at.table, &at.add_constraints, ctx).await? {
            add_items.push(constraint_fragment(spec, &name));
        }
        if !add_items.is_empty() {
            statements.push(format!("ALTER TABLE {table} ADD {}", add_items.join(", ")));
        }

        if let Some(options) = options_fragment(&at.table_options, IGNORED_OPTIONS) {
            statements.push(format!("ALTER TABLE {table} {options}"));
        }
        for column in &at.modify_columns {
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {}",
                column_def(&self.sanitize(column), &name)
            ));
        }
        if !at.primary_key.is_empty() {
            let cols = at.primary_key.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
            statements.push(format!("ALTER TABLE {table} ADD PRIMARY KEY ({cols})"));
        }
        Ok(statements)
    }

    async fn create_index(&self, ci: &CreateIndex, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_create_index(&ci.on, &ci.index, ctx).await? {
            return Ok(Vec::new());
        }
        Ok(vec![create_index_sql(
            &ci.index,
            &ci.on,
            &ci.columns,
            ci.unique,
            &|n| self.ident(n),
        )])
    }

    async fn drop_index(&self, di: &DropIndex, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_drop_index(&di.on, &di.index, ctx).await? {
            return Ok(Vec::new());
        }
        Ok(vec![format!(
            "DROP INDEX {} ON {}",
            self.ident(&di.index),
            self.ident(&di.on)
        )])
    }
}

#[async_trait]
impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn sql_name(&self, ident: &str) -> String {
        self.ident(ident)
    }

    async fn compile(&self, command: &Command, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        match command {
            Command::CreateTable(ct) => self.create_table(ct, ctx).await,
            Command::DropTable(dt) => Ok(vec![format!("DROP TABLE {}", self.ident(&dt.table))]),
            Command::AlterTable(at) => self.alter_table(at, ctx).await,
            Command::CreateIndex(ci) => self.create_index(ci, ctx).await,
            Command::DropIndex(di) => self.drop_index(di, ctx).await,
            Command::InsertInto(ins) => {
                insert_into_sql(ins, StringStyle::SingleQuoted, &|n| self.ident(n))
            }
            Command::Update(upd) => update_sql(upd, self.name()),
        }
    }

    fn version_table_ddl(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {} (version VARCHAR(14) NOT NULL, created DATETIME NOT NULL)",
            self.ident(table)
        )
    }

    fn insert_version_sql(&self, table: &str, version: &str, _now_millis: i64) -> String {
        format!(
            "INSERT INTO {} (version, created) VALUES ('{}', CURRENT_TIMESTAMP)",
            self.ident(table),
            version
        )
    }

    fn create_database_sql(&self, database: &str) -> Option<String> {
        let name = crate::names::to_sql_name(database);
        Some(format!(
            "IF NOT EXISTS (SELECT * FROM sys.databases WHERE name = '{name}') \
             CREATE DATABASE {name}"
        ))
    }
}
