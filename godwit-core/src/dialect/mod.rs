//! Dialect compilers: one declarative command in, zero or more SQL
//! statements out.
//!
//! An empty output means "skip — the live schema already satisfies this
//! command" and is not an error. Compilation reads two ambient inputs
//! through [`CompileContext`]: the live inspector (absent in tests and dry
//! planning, where every existence check is false) and the plan of commands
//! already compiled in this migration.

pub mod h2;
pub mod mysql;
pub mod postgres;
pub mod sqlserver;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use tracing::info;

use crate::command::{
    AlterTable, ColumnSpec, Command, ConstraintSpec, CreateTable, InsertInto, TableOption, Update,
    Value, PRIMARY_KEY_SENTINEL,
};
use crate::error::{Error, Result};
use crate::inspect::CompileContext;

pub use h2::{H2Dialect, H2Version};
pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;
pub use sqlserver::SqlServerDialect;

/// Column injected by the placeholder expansion of `create-table` with
/// table-options, and dropped again as its last step.
pub const PLACEHOLDER_COLUMN: &str = "__placeholder";

/// A backend-specific compiler plus the version-registry SQL it owns.
#[async_trait]
pub trait Dialect: Send + Sync {
    /// Subprotocol name; also the `update` override key.
    fn name(&self) -> &'static str;

    /// Identifier conversion for this backend.
    fn sql_name(&self, ident: &str) -> String {
        crate::names::to_sql_name(ident)
    }

    /// Translate one command into backend SQL.
    async fn compile(&self, command: &Command, ctx: &CompileContext<'_>) -> Result<Vec<String>>;

    /// DDL for the version registry table.
    fn version_table_ddl(&self, table: &str) -> String;

    /// Registry row for a successfully applied migration.
    fn insert_version_sql(&self, table: &str, version: &str, now_millis: i64) -> String;

    fn delete_version_sql(&self, table: &str, version: &str) -> String {
        format!(
            "DELETE FROM {} WHERE version = '{}'",
            self.sql_name(table),
            version
        )
    }

    fn select_versions_sql(&self, table: &str) -> String {
        format!("SELECT version FROM {} ORDER BY version", self.sql_name(table))
    }

    /// Statement creating the database itself, for backends that support
    /// doing so from a live connection.
    fn create_database_sql(&self, _database: &str) -> Option<String> {
        None
    }
}

/// How a backend writes string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StringStyle {
    /// MySQL's non-standard double-quoted form.
    DoubleQuoted,
    SingleQuoted,
}

pub(crate) fn value_literal(value: &Value, style: StringStyle) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => match style {
            StringStyle::DoubleQuoted => format!("\"{}\"", s.replace('"', "\\\"")),
            StringStyle::SingleQuoted => format!("'{}'", s.replace('\'', "''")),
        },
    }
}

pub(crate) type NameFn<'a> = &'a (dyn Fn(&str) -> String + Sync);

pub(crate) fn column_def(col: &ColumnSpec, name: NameFn) -> String {
    if col.tokens.is_empty() {
        name(&col.name)
    } else {
        format!("{} {}", name(&col.name), col.tokens.join(" "))
    }
}

/// `CONSTRAINT <name> FOREIGN KEY <ref-specs>`.
pub(crate) fn constraint_fragment(spec: &ConstraintSpec, name: NameFn) -> String {
    format!("CONSTRAINT {} FOREIGN KEY {}", name(&spec.name), spec.refs.join(" "))
}

pub(crate) fn primary_key_fragment(columns: &[String], name: NameFn) -> Option<String> {
    if columns.is_empty() {
        return None;
    }
    let cols = columns.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
    Some(format!("PRIMARY KEY ({cols})"))
}

/// `NAME=value, ...` with the backend's ignored options removed.
pub(crate) fn options_fragment(options: &[TableOption], ignored: &[&str]) -> Option<String> {
    let kept: Vec<String> = options
        .iter()
        .filter(|o| !ignored.contains(&o.name.to_lowercase().as_str()))
        .map(|o| format!("{}={}", o.name, o.value))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join(", "))
    }
}

/// Single-statement `CREATE TABLE` body: columns, then the primary key,
/// then constraint lines.
pub(crate) fn create_table_sql(
    table: &str,
    columns: &[ColumnSpec],
    primary_key: &[String],
    constraints: &[ConstraintSpec],
    name: NameFn,
) -> String {
    let mut parts: Vec<String> = columns.iter().map(|c| column_def(c, name)).collect();
    if let Some(pk) = primary_key_fragment(primary_key, name) {
        parts.push(pk);
    }
    for spec in constraints {
        parts.push(constraint_fragment(spec, name));
    }
    format!("CREATE TABLE {} ({})", name(table), parts.join(", "))
}

/// The four-statement rewrite of `create-table` carrying table-options:
/// bare placeholder table, one synthetic `alter-table` with the real
/// columns + options + constraints, the primary key, then the placeholder
/// drop. Re-enters the dialect's own `compile` for the synthetic commands.
pub(crate) async fn expand_create_table(
    dialect: &dyn Dialect,
    ct: &CreateTable,
    ctx: &CompileContext<'_>,
    name: NameFn<'_>,
) -> Result<Vec<String>> {
    let placeholder = CreateTable {
        table: ct.table.clone(),
        columns: vec![ColumnSpec::new(PLACEHOLDER_COLUMN, &["int"])],
        ..Default::default()
    };
    let mut statements = dialect
        .compile(&Command::CreateTable(placeholder), ctx)
        .await?;

    let alter = AlterTable {
        table: ct.table.clone(),
        add_columns: ct.columns.clone(),
        add_constraints: ct.constraints.clone(),
        table_options: ct.table_options.clone(),
        ..Default::default()
    };
    statements.extend(dialect.compile(&Command::AlterTable(alter), ctx).await?);

    if !ct.primary_key.is_empty() {
        let cols = ct
            .primary_key
            .iter()
            .map(|c| name(c))
            .collect::<Vec<_>>()
            .join(", ");
        statements.push(format!("ALTER TABLE {} ADD PRIMARY KEY ({})", name(&ct.table), cols));
    }

    statements.push(format!(
        "ALTER TABLE {} DROP COLUMN {}",
        name(&ct.table),
        name(PLACEHOLDER_COLUMN)
    ));
    Ok(statements)
}

// --- idempotency predicates, uniform across backends ---

pub(crate) async fn should_skip_create_table(
    table: &str,
    ctx: &CompileContext<'_>,
) -> Result<bool> {
    let skip = ctx.table_exists(table).await? && !ctx.plan.drops_table(table);
    if skip {
        info!(table, "table already exists, skipping create-table");
    }
    Ok(skip)
}

pub(crate) async fn addable_columns<'c>(
    table: &str,
    columns: &'c [ColumnSpec],
    ctx: &CompileContext<'_>,
) -> Result<Vec<&'c ColumnSpec>> {
    let mut kept = Vec::new();
    for col in columns {
        let exists = ctx.column_exists(table, &col.name).await?;
        if exists && !ctx.plan.drops_column(table, &col.name) {
            info!(table, column = %col.name, "column already exists, skipping add");
        } else {
            kept.push(col);
        }
    }
    Ok(kept)
}

pub(crate) async fn droppable_columns<'c>(
    table: &str,
    columns: &'c [String],
    ctx: &CompileContext<'_>,
) -> Result<Vec<&'c str>> {
    let mut kept = Vec::new();
    for col in columns {
        if ctx.column_exists(table, col).await? {
            kept.push(col.as_str());
        } else {
            info!(table, column = %col, "column does not exist, skipping drop");
        }
    }
    Ok(kept)
}

pub(crate) async fn addable_constraints<'c>(
    table: &str,
    constraints: &'c [ConstraintSpec],
    ctx: &CompileContext<'_>,
) -> Result<Vec<&'c ConstraintSpec>> {
    let mut kept = Vec::new();
    for spec in constraints {
        let exists = ctx.foreign_key_exists(table, &spec.name).await?;
        if exists && !ctx.plan.drops_constraint(table, &spec.name) {
            info!(table, constraint = %spec.name, "constraint already exists, skipping add");
        } else {
            kept.push(spec);
        }
    }
    Ok(kept)
}

/// A `drop-constraints` entry that survived the idempotency check.
pub(crate) enum ConstraintDrop<'c> {
    ForeignKey(&'c str),
    PrimaryKey,
}

pub(crate) async fn droppable_constraints<'c>(
    table: &str,
    names: &'c [String],
    ctx: &CompileContext<'_>,
) -> Result<Vec<ConstraintDrop<'c>>> {
    let mut kept = Vec::new();
    for constraint in names {
        if constraint == PRIMARY_KEY_SENTINEL {
            if ctx.primary_key_exists(table).await? {
                kept.push(ConstraintDrop::PrimaryKey);
            } else {
                info!(table, "primary key does not exist, skipping drop");
            }
        } else if ctx.foreign_key_exists(table, constraint).await? {
            kept.push(ConstraintDrop::ForeignKey(constraint));
        } else {
            info!(table, constraint = %constraint, "constraint does not exist, skipping drop");
        }
    }
    Ok(kept)
}

pub(crate) async fn should_skip_create_index(
    table: &str,
    index: &str,
    ctx: &CompileContext<'_>,
) -> Result<bool> {
    let skip = ctx.index_exists(table, index).await? && !ctx.plan.drops_index(table, index);
    if skip {
        info!(table, index, "index already exists, skipping create-index");
    }
    Ok(skip)
}

pub(crate) async fn should_skip_drop_index(
    table: &str,
    index: &str,
    ctx: &CompileContext<'_>,
) -> Result<bool> {
    let skip = !ctx.index_exists(table, index).await?;
    if skip {
        info!(table, index, "index does not exist, skipping drop-index");
    }
    Ok(skip)
}

// --- shared statement builders ---

pub(crate) fn create_index_sql(
    index: &str,
    on: &str,
    columns: &[String],
    unique: bool,
    name: NameFn,
) -> String {
    let unique = if unique { "UNIQUE " } else { "" };
    let cols = columns.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
    format!("CREATE {}INDEX {} ON {} ({})", unique, name(index), name(on), cols)
}

pub(crate) fn insert_into_sql(
    ins: &InsertInto,
    style: StringStyle,
    name: NameFn,
) -> Result<Vec<String>> {
    let table = name(&ins.table);
    let columns = if ins.columns.is_empty() {
        String::new()
    } else {
        let cols = ins.columns.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
        format!(" ({cols})")
    };

    if !ins.values.is_empty() {
        let rows = ins
            .values
            .iter()
            .map(|row| {
                let vals = row
                    .iter()
                    .map(|v| value_literal(v, style))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("({vals})")
            })
            .collect::<Vec<_>>()
            .join(",");
        return Ok(vec![format!("INSERT INTO {table}{columns} VALUES {rows}")]);
    }
    if let Some(query) = ins.query.as_deref().filter(|q| !q.is_empty()) {
        return Ok(vec![format!("INSERT INTO {table}{columns} {query}")]);
    }
    Err(Error::Validation(
        "insert-into requires values or query".to_string(),
    ))
}

pub(crate) fn update_sql(upd: &Update, backend: &str) -> Result<Vec<String>> {
    if let Some(text) = upd.override_for(backend) {
        return Ok(vec![text.to_string()]);
    }
    match upd.query.as_deref().filter(|q| !q.is_empty()) {
        Some(query) => Ok(vec![query.to_string()]),
        None => Err(Error::Validation("update requires a query".to_string())),
    }
}
