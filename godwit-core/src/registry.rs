//! The backend registry and the high-level migrator built through it.
//!
//! A registry maps subprotocol strings to factories producing a dialect
//! compiler plus inspector over a shared driver. H2 is the special case:
//! its factory asks the live server for `h2version()` once and fixes the
//! v1/v2 behavior for the life of the migrator.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::dialect::{Dialect, H2Dialect, H2Version, MysqlDialect, PostgresDialect, SqlServerDialect};
use crate::driver::{Driver, MysqlDriver, PostgresDriver};
use crate::error::{Error, Result};
use crate::inspect::backends::{H2Inspector, MysqlInspector, PostgresInspector, SqlServerInspector};
use crate::inspect::Inspector;
use crate::migration::{Migration, MigrationStore};
use crate::runner::{dry_run_requested, Runner};

/// Builds the per-backend compiler and inspector over a live driver.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn build(
        &self,
        config: &Config,
        driver: Arc<dyn Driver>,
    ) -> Result<(Box<dyn Dialect>, Box<dyn Inspector>)>;
}

struct MysqlFactory;

#[async_trait]
impl BackendFactory for MysqlFactory {
    async fn build(
        &self,
        config: &Config,
        driver: Arc<dyn Driver>,
    ) -> Result<(Box<dyn Dialect>, Box<dyn Inspector>)> {
        let database = config.db.database.clone().unwrap_or_default();
        Ok((
            Box::new(MysqlDialect::new()),
            Box::new(MysqlInspector::new(driver, database)),
        ))
    }
}

struct PostgresFactory;

#[async_trait]
impl BackendFactory for PostgresFactory {
    async fn build(
        &self,
        _config: &Config,
        driver: Arc<dyn Driver>,
    ) -> Result<(Box<dyn Dialect>, Box<dyn Inspector>)> {
        Ok((
            Box::new(PostgresDialect::new()),
            Box::new(PostgresInspector::new(driver)),
        ))
    }
}

struct H2Factory;

#[async_trait]
impl BackendFactory for H2Factory {
    async fn build(
        &self,
        _config: &Config,
        driver: Arc<dyn Driver>,
    ) -> Result<(Box<dyn Dialect>, Box<dyn Inspector>)> {
        let rows = driver.fetch_column("SELECT h2version()").await?;
        let raw = rows
            .first()
            .ok_or_else(|| Error::Driver("h2version() returned no rows".to_string()))?;
        let version = H2Version::from_version_string(raw);
        Ok((
            Box::new(H2Dialect::new(version)),
            Box::new(H2Inspector::new(driver, version)),
        ))
    }
}

struct SqlServerFactory;

#[async_trait]
impl BackendFactory for SqlServerFactory {
    async fn build(
        &self,
        config: &Config,
        driver: Arc<dyn Driver>,
    ) -> Result<(Box<dyn Dialect>, Box<dyn Inspector>)> {
        let database = config.db.database.clone().unwrap_or_default();
        Ok((
            Box::new(SqlServerDialect::new()),
            Box::new(SqlServerInspector::new(driver, database)),
        ))
    }
}

pub struct BackendRegistry {
    factories: HashMap<String, Arc<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// The registry with the four stock backends.
    pub fn standard() -> Self {
        let mut registry = Self { factories: HashMap::new() };
        registry.register("mysql", Arc::new(MysqlFactory));
        registry.register("postgresql", Arc::new(PostgresFactory));
        registry.register("h2", Arc::new(H2Factory));
        registry.register("sqlserver", Arc::new(SqlServerFactory));
        registry
    }

    pub fn register(&mut self, subprotocol: &str, factory: Arc<dyn BackendFactory>) {
        self.factories.insert(subprotocol.to_string(), factory);
    }

    pub fn supports(&self, subprotocol: &str) -> bool {
        self.factories.contains_key(subprotocol)
    }

    /// Assemble a migrator for the configured backend over the given driver.
    pub async fn open(&self, config: &Config, driver: Arc<dyn Driver>) -> Result<Migrator> {
        let factory = self
            .factories
            .get(&config.db.subprotocol)
            .ok_or_else(|| Error::UnsupportedBackend(config.db.subprotocol.clone()))?;
        let (dialect, inspector) = factory.build(config, driver.clone()).await?;
        let runner = Runner::new(
            dialect,
            Some(inspector),
            driver,
            config.version_table.clone(),
            dry_run_requested(),
        );
        let store = MigrationStore::new(&config.migration_dir);
        Ok(Migrator::new(runner, store, config.db.database.clone()))
    }
}

/// Connect the bundled sqlx driver for the configured backend.
///
/// SQL Server and H2 compile and plan like every other backend but ship no
/// driver here; hand [`BackendRegistry::open`] your own [`Driver`] for them.
pub async fn connect_driver(config: &Config) -> Result<Arc<dyn Driver>> {
    match config.db.subprotocol.as_str() {
        "postgresql" => Ok(Arc::new(PostgresDriver::connect(&config.db.url()?).await?)),
        "mysql" => Ok(Arc::new(MysqlDriver::connect(&config.db.url()?).await?)),
        "h2" | "sqlserver" => Err(Error::Driver(format!(
            "no bundled driver for '{}'; supply a custom Driver implementation",
            config.db.subprotocol
        ))),
        other => Err(Error::UnsupportedBackend(other.to_string())),
    }
}

/// High-level operations over one runner and one migration store.
pub struct Migrator {
    runner: Runner,
    store: MigrationStore,
    database: Option<String>,
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator").finish_non_exhaustive()
    }
}

impl Migrator {
    pub fn new(runner: Runner, store: MigrationStore, database: Option<String>) -> Self {
        Self { runner, store, database }
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn store(&self) -> &MigrationStore {
        &self.store
    }

    pub async fn init(&self) -> Result<()> {
        self.runner.init(self.database.as_deref()).await
    }

    pub async fn current_version(&self) -> Result<Option<String>> {
        self.runner.current_version().await
    }

    pub async fn versions(&self) -> Result<Vec<String>> {
        self.runner.applied_versions().await
    }

    /// Apply pending migrations in version order.
    ///
    /// With `only`, the set of unapplied migrations is filtered to the named
    /// versions; otherwise everything strictly after the current version
    /// runs.
    pub async fn migrate(&self, only: Option<&[String]>) -> Result<Vec<String>> {
        let migrations = self.store.list()?;
        let applied: HashSet<String> = self.runner.applied_versions().await?.into_iter().collect();
        let current = applied.iter().max().cloned();

        let pending: Vec<&Migration> = match only {
            Some(names) if !names.is_empty() => migrations
                .iter()
                .filter(|m| !applied.contains(&m.version))
                .filter(|m| names.iter().any(|n| n == &m.version))
                .collect(),
            _ => migrations
                .iter()
                .filter(|m| !applied.contains(&m.version))
                .filter(|m| match &current {
                    Some(current) => m.version.as_str() > current.as_str(),
                    None => true,
                })
                .collect(),
        };

        let mut done = Vec::new();
        for migration in pending {
            self.runner.apply(migration).await?;
            done.push(migration.version.clone());
        }
        Ok(done)
    }

    /// Roll back the newest applied migration, if any.
    pub async fn rollback(&self) -> Result<Option<String>> {
        let Some(current) = self.current_version().await? else {
            return Ok(None);
        };
        let migration = self.find_migration(&current)?;
        self.runner.revert(&migration).await?;
        Ok(Some(current))
    }

    /// Roll back every applied migration, newest first.
    pub async fn reset(&self) -> Result<Vec<String>> {
        let mut versions = self.runner.applied_versions().await?;
        versions.sort();
        let mut reverted = Vec::new();
        for version in versions.into_iter().rev() {
            let migration = self.find_migration(&version)?;
            self.runner.revert(&migration).await?;
            reverted.push(version);
        }
        Ok(reverted)
    }

    /// Versions present as files but absent from the registry.
    pub async fn missing(&self) -> Result<Vec<String>> {
        let applied: HashSet<String> = self.runner.applied_versions().await?.into_iter().collect();
        Ok(self
            .store
            .list()?
            .into_iter()
            .map(|m| m.version)
            .filter(|v| !applied.contains(v))
            .collect())
    }

    fn find_migration(&self, version: &str) -> Result<Migration> {
        self.store
            .list()?
            .into_iter()
            .find(|m| m.version == version)
            .ok_or_else(|| {
                Error::Validation(format!("no migration file found for version {version}"))
            })
    }
}
