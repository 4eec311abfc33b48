//! MySQL command compiler.
//!
//! Column tokens flow through verbatim; table-options are legal only on a
//! standalone `ALTER`, so `create-table` carrying options takes the
//! placeholder expansion. String literals keep MySQL's double-quoted form.

use async_trait::async_trait;

use super::{
    addable_columns, addable_constraints, column_def, constraint_fragment, create_index_sql,
    create_table_sql, droppable_columns, droppable_constraints, expand_create_table,
    insert_into_sql, options_fragment, should_skip_create_index, should_skip_create_table,
    should_skip_drop_index, update_sql, ConstraintDrop, Dialect, StringStyle,
};
use crate::command::{AlterTable, Command, CreateIndex, CreateTable, DropIndex};
use crate::error::Result;
use crate::inspect::CompileContext;
use crate::names::to_sql_name;

#[derive(Debug, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
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

        if let Some(options) = options_fragment(&at.table_options, &[]) {
            statements.push(format!("ALTER TABLE {table} {options}"));
        }
        if let Some(charset) = &at.character_set {
            let mut stmt = format!("ALTER TABLE {table} CONVERT TO CHARACTER SET {}", charset.name);
            if let Some(collation) = &charset.collation {
                stmt.push_str(&format!(" COLLATE {collation}"));
            }
            statements.push(stmt);
        }
        for drop in droppable_constraints(&at.table, &at.drop_constraints, ctx).await? {
            match drop {
                ConstraintDrop::PrimaryKey => {
                    statements.push(format!("ALTER TABLE {table} DROP PRIMARY KEY"));
                }
                ConstraintDrop::ForeignKey(constraint) => {
                    statements.push(format!(
                        "ALTER TABLE {table} DROP FOREIGN KEY {}",
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
                "ALTER TABLE {table} MODIFY COLUMN {}",
                column_def(column, &name)
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
        Ok(vec![format!(
            "DROP INDEX {} ON {}",
            self.sql_name(&di.index),
            self.sql_name(&di.on)
        )])
    }
}

#[async_trait]
impl Dialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    async fn compile(&self, command: &Command, ctx: &CompileContext<'_>) -> Result<Vec<String>> {
        match command {
            Command::CreateTable(ct) => self.create_table(ct, ctx).await,
            Command::DropTable(dt) => Ok(vec![format!("DROP TABLE {}", self.sql_name(&dt.table))]),
            Command::AlterTable(at) => self.alter_table(at, ctx).await,
            Command::CreateIndex(ci) => self.create_index(ci, ctx).await,
            Command::DropIndex(di) => self.drop_index(di, ctx).await,
            Command::InsertInto(ins) => {
                insert_into_sql(ins, StringStyle::DoubleQuoted, &|n| self.sql_name(n))
            }
            Command::Update(upd) => update_sql(upd, self.name()),
        }
    }

    fn version_table_ddl(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {} (version VARCHAR(14) NOT NULL, created BIGINT NOT NULL)",
            to_sql_name(table)
        )
    }

    fn insert_version_sql(&self, table: &str, version: &str, now_millis: i64) -> String {
        format!(
            "INSERT INTO {} (version, created) VALUES ('{}', {})",
            to_sql_name(table),
            version,
            now_millis
        )
    }

    fn create_database_sql(&self, database: &str) -> Option<String> {
        Some(format!("CREATE DATABASE IF NOT EXISTS {}", to_sql_name(database)))
    }
}
