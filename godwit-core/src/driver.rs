//! The SQL execution seam.
//!
//! Everything the core needs from a database connection is three calls:
//! execute a statement, fetch a single text column, fetch a count. sqlx
//! pools back the PostgreSQL and MySQL implementations; any other backend
//! plugs in by implementing [`Driver`]. The [`RecordingDriver`] captures
//! statements instead of running them, for planning output and tests.

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::postgres::PgPoolOptions;
use sqlx::{MySqlPool, PgPool, Row};

use crate::error::{Error, Result};

#[async_trait]
pub trait Driver: Send + Sync {
    /// Run one statement, returning the affected-row count.
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Run a query and return the first column of every row as text.
    async fn fetch_column(&self, sql: &str) -> Result<Vec<String>>;

    /// Run a scalar count query.
    async fn fetch_count(&self, sql: &str) -> Result<i64>;
}

/// Strip the noise prefixes MySQL and PostgreSQL put on batch-update
/// messages before surfacing them.
pub fn clean_driver_message(message: &str) -> String {
    let trimmed = message.trim();
    for prefix in ["FATAL: ", "ERROR: "] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return rest.to_string();
        }
    }
    trimmed.to_string()
}

fn driver_error(err: sqlx::Error) -> Error {
    let message = match &err {
        sqlx::Error::Database(db) => clean_driver_message(db.message()),
        other => other.to_string(),
    };
    Error::Driver(message)
}

pub struct PostgresDriver {
    pool: PgPool,
}

impl PostgresDriver {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .connect(url)
            .await
            .map_err(driver_error)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Driver for PostgresDriver {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let done = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(driver_error)?;
        Ok(done.rows_affected())
    }

    async fn fetch_column(&self, sql: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(driver_error)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(driver_error))
            .collect()
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64> {
        sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(driver_error)
    }
}

pub struct MysqlDriver {
    pool: MySqlPool,
}

impl MysqlDriver {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .connect(url)
            .await
            .map_err(driver_error)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Driver for MysqlDriver {
    async fn execute(&self, sql: &str) -> Result<u64> {
        let done = sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(driver_error)?;
        Ok(done.rows_affected())
    }

    async fn fetch_column(&self, sql: &str) -> Result<Vec<String>> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(driver_error)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(driver_error))
            .collect()
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64> {
        sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(driver_error)
    }
}

/// Captures executed statements instead of running them.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    statements: Mutex<Vec<String>>,
    /// Canned first-column results keyed by exact query text.
    columns: Mutex<Vec<(String, Vec<String>)>>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned result for a query.
    pub fn respond(&self, sql: &str, rows: &[&str]) {
        self.columns
            .lock()
            .expect("recording driver lock")
            .push((sql.to_string(), rows.iter().map(|r| r.to_string()).collect()));
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.lock().expect("recording driver lock").clone()
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn execute(&self, sql: &str) -> Result<u64> {
        self.statements
            .lock()
            .expect("recording driver lock")
            .push(sql.to_string());
        Ok(0)
    }

    async fn fetch_column(&self, sql: &str) -> Result<Vec<String>> {
        let canned = self.columns.lock().expect("recording driver lock");
        Ok(canned
            .iter()
            .find(|(query, _)| query == sql)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default())
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64> {
        Ok(self.fetch_column(sql).await?.len() as i64)
    }
}
