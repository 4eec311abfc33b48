//! H2 command compiler, covering both major server generations.
//!
//! The two generations differ in identifier casing (v2 upper-cases and
//! quotes reserved words), constraint-drop syntax, and catalog layout; the
//! version is resolved once at migrator construction and cached here.
//!
//! H2 refuses `CHARACTER SET`/`COLLATE` column tokens and cannot index
//! large-object columns, so the sanitizer strips the former and
//! `create-index` drops the latter. Adding a foreign key also drops any
//! pre-existing differently-named constraint covering the same column
//! tuple, since H2 would otherwise keep both.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    addable_columns, addable_constraints, column_def, constraint_fragment, droppable_columns,
    droppable_constraints, expand_create_table, insert_into_sql, should_skip_create_index,
    should_skip_create_table, should_skip_drop_index, update_sql, ConstraintDrop, Dialect,
    StringStyle,
};
use crate::command::{
    AlterTable, ColumnSpec, Command, CreateIndex, CreateTable, DropIndex, PRIMARY_KEY_SENTINEL,
};
use crate::error::Result;
use crate::inspect::CompileContext;
use crate::names::{h2v2_name, to_sql_name};

/// Major H2 server generation, parsed from `SELECT h2version()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum H2Version {
    V1,
    V2,
}

impl H2Version {
    /// Parse a full version string such as "2.2.224".
    pub fn from_version_string(version: &str) -> Self {
        let major: u32 = version
            .split('.')
            .next()
            .and_then(|m| m.trim().parse().ok())
            .unwrap_or(1);
        if major >= 2 {
            H2Version::V2
        } else {
            H2Version::V1
        }
    }
}

/// Column types H2 will not index.
const NON_INDEXABLE: &[&str] = &[
    "CLOB",
    "NCLOB",
    "BLOB",
    "TINYBLOB",
    "MEDIUMBLOB",
    "LONGBLOB",
    "IMAGE",
    "OID",
    "TINYTEXT",
    "TEXT",
    "MEDIUMTEXT",
    "LONGTEXT",
    "NTEXT",
];

fn fk_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\((\w+)\)\s+REFERENCES\s+(\w+)\((\w+)\)").expect("foreign key ref regex")
    })
}

fn charset_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(CHARACTER\s+SET|COLLATE)\b").expect("charset token regex"))
}

fn name_length_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\d+\)$").expect("name length regex"))
}

#[derive(Debug)]
pub struct H2Dialect {
    version: H2Version,
}

impl H2Dialect {
    pub fn new(version: H2Version) -> Self {
        Self { version }
    }

    pub fn version(&self) -> H2Version {
        self.version
    }

    fn ident(&self, ident: &str) -> String {
        match self.version {
            H2Version::V1 => to_sql_name(ident),
            H2Version::V2 => h2v2_name(ident),
        }
    }

    /// Strip unsupported tokens and defensively remove a length suffix from
    /// the column name itself.
    fn sanitize(&self, col: &ColumnSpec) -> ColumnSpec {
        let name = name_length_regex().replace(&col.name, "").into_owned();
        let tokens = col
            .tokens
            .iter()
            .filter(|t| !charset_token_regex().is_match(t))
            .map(|t| {
                if self.version == H2Version::V1 && t.eq_ignore_ascii_case("DEFAULT NULL") {
                    "NULL".to_string()
                } else {
                    t.clone()
                }
            })
            .collect();
        ColumnSpec { name, tokens }
    }

    fn drop_constraint_sql(&self, table: &str, constraint: &str) -> String {
        match self.version {
            H2Version::V1 => format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                self.ident(table),
                self.ident(constraint)
            ),
            H2Version::V2 => format!(
                "ALTER TABLE {} DROP CONSTRAINT IF EXISTS {}",
                self.ident(table),
                self.ident(constraint)
            ),
        }
    }

    async fn create_table(&self, ct: &CreateTable, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_create_table(&ct.table, ctx).await? {
            return Ok(Vec::new());
        }
        if !ct.table_options.is_empty() {
            return expand_create_table(self, ct, ctx, &|n| self.ident(n)).await;
        }
        let columns: Vec<ColumnSpec> = ct.columns.iter().map(|c| self.sanitize(c)).collect();
        Ok(vec![super::create_table_sql(
            &ct.table,
            &columns,
            &ct.primary_key,
            &ct.constraints,
            &|n| self.ident(n),
        )])
    }

    /// Is this constraint already going away, either earlier in the plan or
    /// in the same alter-table?
    fn scheduled_for_drop(&self, at: &AlterTable, ctx: &CompileContext<'_>, constraint: &str) -> bool {
        at.drop_constraints
            .iter()
            .any(|d| d.eq_ignore_ascii_case(constraint))
            || ctx.plan.drops_constraint(&at.table, constraint)
            || ctx
                .plan
                .drops_constraint(&at.table, &constraint.to_lowercase())
    }

    async fn alter_table(&self, at: &AlterTable, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        let table = self.ident(&at.table);
        let name = |n: &str| self.ident(n);
        let mut statements = Vec::new();

        // table-options and character-set are unsupported on H2

        for drop in droppable_constraints(&at.table, &at.drop_constraints, ctx).await? {
            match drop {
                ConstraintDrop::PrimaryKey => {
                    statements.push(format!("ALTER TABLE {table} DROP PRIMARY KEY"));
                }
                ConstraintDrop::ForeignKey(constraint) => {
                    statements.push(self.drop_constraint_sql(&at.table, constraint));
                }
            }
        }

        let dropped = droppable_columns(&at.table, &at.drop_columns, ctx).await?;
        if !dropped.is_empty() {
            let cols = dropped.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
            statements.push(format!("ALTER TABLE {table} DROP COLUMN {cols}"));
        }

        let added = addable_columns(&at.table, &at.add_columns, ctx).await?;
        if !added.is_empty() {
            let defs = added
                .iter()
                .map(|c| column_def(&self.sanitize(c), &name))
                .collect::<Vec<_>>()
                .join(", ");
            statements.push(format!("ALTER TABLE {table} ADD COLUMN ({defs})"));
        }

        for column in &at.modify_columns {
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {}",
                column_def(&self.sanitize(column), &name)
            ));
        }

        if !at.primary_key.is_empty() {
            let dropped_here = at
                .drop_constraints
                .iter()
                .any(|c| c == PRIMARY_KEY_SENTINEL);
            let exists = ctx.primary_key_exists(&at.table).await?;
            if exists && !dropped_here && !ctx.plan.drops_primary_key(&at.table) {
                info!(table = %at.table, "primary key already exists, skipping add");
            } else {
                let cols = at.primary_key.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
                statements.push(format!("ALTER TABLE {table} ADD PRIMARY KEY ({cols})"));
            }
        }

        for spec in addable_constraints(&at.table, &at.add_constraints, ctx).await? {
            let ref_spec = spec.refs.join(" ");
            match fk_ref_regex().captures(&ref_spec) {
                Some(caps) => {
                    let fk_column = caps.get(1).expect("fk column group").as_str();
                    let pk_table = caps.get(2).expect("pk table group").as_str();
                    let pk_column = caps.get(3).expect("pk column group").as_str();
                    let existing = ctx
                        .matching_foreign_keys(&at.table, fk_column, pk_table, pk_column)
                        .await?;
                    for duplicate in existing {
                        if duplicate.eq_ignore_ascii_case(&to_sql_name(&spec.name)) {
                            continue;
                        }
                        if self.scheduled_for_drop(at, ctx, &duplicate) {
                            continue;
                        }
                        info!(
                            table = %at.table,
                            constraint = %duplicate,
                            "dropping duplicate foreign key before add"
                        );
                        statements.push(self.drop_constraint_sql(&at.table, &duplicate));
                    }
                }
                None => {
                    error!(
                        constraint = %spec.name,
                        ref_spec = %ref_spec,
                        "cannot parse foreign key ref-spec"
                    );
                }
            }
            statements.push(format!("ALTER TABLE {table} ADD {}", constraint_fragment(spec, &name)));
        }

        Ok(statements)
    }

    /// Declared type of an index column, normalized for the non-indexable
    /// check: live catalog first, then types declared earlier in the plan.
    async fn index_column_type(
        &self,
        table: &str,
        column: &str,
        ctx: &CompileContext<'_>,
    ) -> Result<Option<String>> {
        let declared = match ctx.column_type(table, column).await? {
            Some(t) => Some(t),
            None => ctx.plan.declared_column_type(table, column),
        };
        Ok(declared.map(|t| {
            let t = t.to_uppercase();
            match t.find('(') {
                Some(open) => t[..open].trim().to_string(),
                None => t.trim().to_string(),
            }
        }))
    }

    fn is_indexable(&self, column_type: &str) -> bool {
        if NON_INDEXABLE.contains(&column_type) {
            return false;
        }
        !(self.version == H2Version::V2 && column_type == "CHARACTER LARGE OBJECT")
    }

    async fn create_index(&self, ci: &CreateIndex, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_create_index(&ci.on, &ci.index, ctx).await? {
            return Ok(Vec::new());
        }
        let mut columns = Vec::new();
        for column in &ci.columns {
            match self.index_column_type(&ci.on, column, ctx).await? {
                Some(t) if !self.is_indexable(&t) => {
                    warn!(
                        table = %ci.on,
                        column = %column,
                        column_type = %t,
                        "column type is not indexable, dropping from index"
                    );
                }
                _ => columns.push(column.clone()),
            }
        }
        if columns.is_empty() {
            warn!(index = %ci.index, table = %ci.on, "no indexable columns remain, skipping index");
            return Ok(Vec::new());
        }
        Ok(vec![super::create_index_sql(
            &ci.index,
            &ci.on,
            &columns,
            ci.unique,
            &|n| self.ident(n),
        )])
    }

    async fn drop_index(&self, di: &DropIndex, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_drop_index(&di.on, &di.index, ctx).await? {
            return Ok(Vec::new());
        }
        Ok(vec![format!("DROP INDEX {}", self.ident(&di.index))])
    }
}

#[async_trait]
impl Dialect for H2Dialect {
    fn name(&self) -> &'static str {
        "h2"
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
        match self.version {
            H2Version::V1 => format!(
                "CREATE TABLE {} (version VARCHAR(14) NOT NULL, created BIGINT NOT NULL)",
                self.ident(table)
            ),
            H2Version::V2 => format!(
                "CREATE TABLE {} (version VARCHAR(14) NOT NULL, \
                 created TIMESTAMP DEFAULT CURRENT_TIMESTAMP NOT NULL)",
                self.ident(table)
            ),
        }
    }

    fn insert_version_sql(&self, table: &str, version: &str, now_millis: i64) -> String {
        match self.version {
            H2Version::V1 => format!(
                "INSERT INTO {} (version, created) VALUES ('{}', {})",
                self.ident(table),
                version,
                now_millis
            ),
            H2Version::V2 => format!(
                "INSERT INTO {} (version, created) VALUES ('{}', CURRENT_TIMESTAMP)",
                self.ident(table),
                version
            ),
        }
    }
}
