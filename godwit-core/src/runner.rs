//! The migration runner: compile, execute, record.
//!
//! One runner binds a dialect compiler, an optional live inspector, and a
//! driver. Per migration it creates a fresh plan, compiles each command in
//! order (recording it in the plan after compilation succeeds), executes
//! the emitted statements one at a time, and finally records the version.
//! A statement failure stops the migration with the version unrecorded;
//! recovery is the driver's transaction scope, not the runner's.

use std::sync::Arc;

use tracing::info;

use crate::command::Command;
use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::Result;
use crate::inspect::{CompileContext, Inspector};
use crate::migration::Migration;
use crate::plan::Plan;

/// Name of the environment variable suppressing statement execution.
pub const DRYRUN_ENV: &str = "TERN_DRYRUN";

/// True when the environment asks for compilation without execution.
pub fn dry_run_requested() -> bool {
    std::env::var(DRYRUN_ENV).map(|v| !v.is_empty()).unwrap_or(false)
}

pub struct Runner {
    dialect: Box<dyn Dialect>,
    inspector: Option<Box<dyn Inspector>>,
    driver: Arc<dyn Driver>,
    version_table: String,
    dry_run: bool,
}

impl Runner {
    pub fn new(
        dialect: Box<dyn Dialect>,
        inspector: Option<Box<dyn Inspector>>,
        driver: Arc<dyn Driver>,
        version_table: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            dialect,
            inspector,
            driver,
            version_table: version_table.into(),
            dry_run,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Create the version registry (and, where the backend supports it, the
    /// database itself) unless already present.
    pub async fn init(&self, database: Option<&str>) -> Result<()> {
        if let Some(db) = database {
            if let Some(sql) = self.dialect.create_database_sql(db) {
                self.execute(&sql).await?;
            }
        }
        let exists = match &self.inspector {
            Some(inspector) => inspector.table_exists(&self.version_table).await?,
            None => false,
        };
        if exists {
            info!(table = %self.version_table, "version table already exists");
            return Ok(());
        }
        self.execute(&self.dialect.version_table_ddl(&self.version_table))
            .await
    }

    /// All recorded versions, oldest first.
    pub async fn applied_versions(&self) -> Result<Vec<String>> {
        self.driver
            .fetch_column(&self.dialect.select_versions_sql(&self.version_table))
            .await
    }

    pub async fn current_version(&self) -> Result<Option<String>> {
        Ok(self.applied_versions().await?.into_iter().last())
    }

    /// Run the up program and record the version.
    pub async fn apply(&self, migration: &Migration) -> Result<()> {
        info!(version = %migration.version, name = %migration.name, "applying migration");
        self.run_program(&migration.up).await?;
        let now_millis = chrono::Utc::now().timestamp_millis();
        self.execute(&self.dialect.insert_version_sql(
            &self.version_table,
            &migration.version,
            now_millis,
        ))
        .await
    }

    /// Run the down program and remove the version row.
    pub async fn revert(&self, migration: &Migration) -> Result<()> {
        info!(version = %migration.version, name = %migration.name, "rolling back migration");
        self.run_program(&migration.down).await?;
        self.execute(
            &self
                .dialect
                .delete_version_sql(&self.version_table, &migration.version),
        )
        .await
    }

    async fn run_program(&self, commands: &[Command]) -> Result<()> {
        let mut plan = Plan::new();
        for command in commands {
            let statements = {
                let ctx = CompileContext::new(self.inspector.as_deref(), &plan);
                self.dialect.compile(command, &ctx).await?
            };
            if statements.is_empty() {
                info!(command = command.kind(), "no statements to run");
            }
            plan.record(command.clone());
            for sql in &statements {
                self.execute(sql).await?;
            }
        }
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<()> {
        if self.dry_run {
            info!(statement = %sql, "dry run, not executing");
            return Ok(());
        }
        info!(statement = %sql, "executing");
        self.driver.execute(sql).await?;
        Ok(())
    }
}
