//! Shared fixtures for the dialect compiler tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::command::Command;
use crate::dialect::Dialect;
use crate::error::Result;
use crate::inspect::{CompileContext, Inspector};
use crate::plan::Plan;

/// In-memory schema snapshot standing in for a live database.
#[derive(Debug, Default)]
pub struct MockInspector {
    tables: HashSet<String>,
    columns: HashSet<(String, String)>,
    primary_keys: HashMap<String, String>,
    foreign_keys: HashSet<(String, String)>,
    indexes: HashSet<(String, String)>,
    column_types: HashMap<(String, String), String>,
    matching_fks: HashMap<(String, String, String, String), Vec<String>>,
}

impl MockInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.tables.insert(table.to_string());
        self
    }

    pub fn with_column(mut self, table: &str, column: &str) -> Self {
        self.tables.insert(table.to_string());
        self.columns.insert((table.to_string(), column.to_string()));
        self
    }

    pub fn with_primary_key(mut self, table: &str, name: &str) -> Self {
        self.primary_keys.insert(table.to_string(), name.to_string());
        self
    }

    pub fn with_foreign_key(mut self, table: &str, name: &str) -> Self {
        self.foreign_keys.insert((table.to_string(), name.to_string()));
        self
    }

    pub fn with_index(mut self, table: &str, index: &str) -> Self {
        self.indexes.insert((table.to_string(), index.to_string()));
        self
    }

    pub fn with_column_type(mut self, table: &str, column: &str, ty: &str) -> Self {
        self.column_types
            .insert((table.to_string(), column.to_string()), ty.to_string());
        self
    }

    pub fn with_matching_fk(
        mut self,
        fk_table: &str,
        fk_column: &str,
        pk_table: &str,
        pk_column: &str,
        names: &[&str],
    ) -> Self {
        self.matching_fks.insert(
            (
                fk_table.to_string(),
                fk_column.to_string(),
                pk_table.to_string(),
                pk_column.to_string(),
            ),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl Inspector for MockInspector {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains(table))
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        Ok(self.columns.contains(&(table.to_string(), column.to_string())))
    }

    async fn primary_key_exists(&self, table: &str) -> Result<bool> {
        Ok(self.primary_keys.contains_key(table))
    }

    async fn primary_key_name(&self, table: &str) -> Result<Option<String>> {
        Ok(self.primary_keys.get(table).cloned())
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        Ok(self
            .foreign_keys
            .contains(&(table.to_string(), constraint.to_string())))
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        Ok(self.indexes.contains(&(table.to_string(), index.to_string())))
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        Ok(self
            .column_types
            .get(&(table.to_string(), column.to_string()))
            .cloned())
    }

    async fn matching_foreign_keys(
        &self,
        fk_table: &str,
        fk_column: &str,
        pk_table: &str,
        pk_column: &str,
    ) -> Result<Vec<String>> {
        Ok(self
            .matching_fks
            .get(&(
                fk_table.to_string(),
                fk_column.to_string(),
                pk_table.to_string(),
                pk_column.to_string(),
            ))
            .cloned()
            .unwrap_or_default())
    }
}

/// Compile against an empty schema (no inspector) and an empty plan.
pub async fn compile_bare(dialect: &dyn Dialect, command: &Command) -> Vec<String> {
    let plan = Plan::new();
    let ctx = CompileContext::new(None, &plan);
    dialect.compile(command, &ctx).await.unwrap()
}

/// Compile with a mock inspector and a pre-seeded plan.
pub async fn compile_with(
    dialect: &dyn Dialect,
    command: &Command,
    inspector: &MockInspector,
    plan: &Plan,
) -> Vec<String> {
    let ctx = CompileContext::new(Some(inspector), plan);
    dialect.compile(command, &ctx).await.unwrap()
}
