//! PostgreSQL command compiler.
//!
//! Column tokens flow through verbatim. PostgreSQL has no table-level
//! options or per-table character sets, so those directives emit nothing.
//! Dropping the primary key requires discovering its constraint name first.

use async_trait::async_trait;
use tracing::warn;

use super::{
    addable_columns, addable_constraints, column_def, constraint_fragment, create_index_sql,
    create_table_sql, droppable_columns, droppable_constraints, expand_create_table,
    insert_into_sql, should_skip_create_index, should_skip_create_table, should_skip_drop_index,
    update_sql, ConstraintDrop, Dialect, StringStyle,
};
use crate::command::{AlterTable, Command, CreateIndex, CreateTable, DropIndex};
use crate::error::Result;
use crate::inspect::CompileContext;
use crate::names::to_sql_name;

#[derive(Debug, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    pub fn new() -> Self {
        Self
    }

    async fn create_table(&self, ct: &CreateTable, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_create_table(&ct.table, ctx).await? {
            return Ok(Vec::new());
        }
        if !ct.table_options.is_empty() {
            return expand_create_table(self, ct, ctx, &|n| self.sql_name(n)).await;
        }
        Ok(vec![create_table_sql(
            &ct.table,
            &ct.columns,
            &ct.primary_key,
            &ct.constraints,
            &|n| self.sql_name(n),
        )])
    }

    async fn alter_table(&self, at: &AlterTable, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        let table = self.sql_name(&at.table);
        let name = |n: &str| self.sql_name(n);
        let mut statements = Vec::new();

        for drop in droppable_constraints(&at.table, &at.drop_constraints, ctx).await? {
            match drop {
                ConstraintDrop::PrimaryKey => match ctx.primary_key_name(&at.table).await? {
                    Some(pk_name) => statements.push(format!(
                        "ALTER TABLE {table} DROP CONSTRAINT {}",
                        to_sql_name(&pk_name)
                    )),
                    None => {
                        warn!(table = %at.table, "cannot discover primary key name, skipping drop");
                    }
                },
                ConstraintDrop::ForeignKey(constraint) => {
                    statements.push(format!(
                        "ALTER TABLE {table} DROP CONSTRAINT {}",
                        name(constraint)
                    ));
                }
            }
        }
        for column in droppable_columns(&at.table, &at.drop_columns, ctx).await? {
            statements.push(format!("ALTER TABLE {table} DROP COLUMN {}", name(column)));
        }
        for column in addable_columns(&at.table, &at.add_columns, ctx).await? {
            statements.push(format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                column_def(column, &name)
            ));
        }
        for column in &at.modify_columns {
            statements.push(format!(
                "ALTER TABLE {table} ALTER COLUMN {} TYPE {}",
                name(&column.name),
                column.tokens.join(" ")
            ));
        }
        if !at.primary_key.is_empty() {
            let cols = at.primary_key.iter().map(|c| name(c)).collect::<Vec<_>>().join(", ");
            statements.push(format!("ALTER TABLE {table} ADD PRIMARY KEY ({cols})"));
        }
        for spec in addable_constraints(&at.table, &at.add_constraints, ctx).await? {
            statements.push(format!(
                "ALTER TABLE {table} ADD {}",
                constraint_fragment(spec, &name)
            ));
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
            &|n| self.sql_name(n),
        )])
    }

    async fn drop_index(&self, di: &DropIndex, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        if should_skip_drop_index(&di.on, &di.index, ctx).await? {
            return Ok(Vec::new());
        }
        Ok(vec![format!("DROP INDEX {}", self.sql_name(&di.index))])
    }
}

#[async_trait]
impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    async fn compile(&self, command: &Command, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        match command {
            Command::CreateTable(ct) => self.create_table(ct, ctx).await,
            Command::DropTable(dt) => Ok(vec![format!("DROP TABLE {}", self.sql_name(&dt.table))]),
            Command::AlterTable(at) => self.alter_table(at, ctx).await,
            Command::CreateIndex(ci) => self.create_index(ci, ctx).await,
            Command::DropIndex(di) => self.drop_index(di, ctx).await,
            Command::InsertInto(ins) => {
                insert_into_sql(ins, StringStyle::SingleQuoted, &|n| self.sql_name(n))
            }
            Command::Update(upd) => update_sql(upd, self.name()),
        }
    }

    fn version_table_ddl(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {} (version VARCHAR(14) NOT NULL, created TIMESTAMP NOT NULL)",
            to_sql_name(table)
        )
    }

    fn insert_version_sql(&self, table: &str, version: &str, _now_millis: i64) -> String {
        format!(
            "INSERT INTO {} (version, created) VALUES ('{}', NOW())",
            to_sql_name(table),
            version
        )
    }
}
