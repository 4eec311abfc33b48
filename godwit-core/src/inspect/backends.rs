//! Catalog queries per backend, evaluated through the driver seam.
//!
//! Identifier arguments arrive in migration-file form and are converted with
//! [`to_sql_name`] before being embedded; H2 additionally upper-cases, since
//! its `INFORMATION_SCHEMA` stores unquoted identifiers upper-cased.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dialect::h2::H2Version;
use crate::driver::Driver;
use crate::error::Result;
use crate::inspect::Inspector;
use crate::names::to_sql_name;

/// Single-quote a value for embedding in a catalog query.
fn lit(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

pub struct MysqlInspector {
    driver: Arc<dyn Driver>,
    database: String,
}

impl MysqlInspector {
    pub fn new(driver: Arc<dyn Driver>, database: impl Into<String>) -> Self {
        Self { driver, database: database.into() }
    }

    async fn count(&self, sql: String) -> Result<bool> {
        Ok(self.driver.fetch_count(&sql).await? > 0)
    }
}

#[async_trait]
impl Inspector for MysqlInspector {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = {} AND table_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table))
        ))
        .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} AND column_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table)),
            lit(&to_sql_name(column))
        ))
        .await
    }

    async fn primary_key_exists(&self, table: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.table_constraints \
             WHERE table_schema = {} AND table_name = {} AND constraint_type = 'PRIMARY KEY'",
            lit(&self.database),
            lit(&to_sql_name(table))
        ))
        .await
    }

    async fn primary_key_name(&self, table: &str) -> Result<Option<String>> {
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT constraint_name FROM information_schema.table_constraints \
                 WHERE table_schema = {} AND table_name = {} AND constraint_type = 'PRIMARY KEY'",
                lit(&self.database),
                lit(&to_sql_name(table))
            ))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.table_constraints \
             WHERE table_schema = {} AND table_name = {} \
             AND constraint_type = 'FOREIGN KEY' AND constraint_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table)),
            lit(&to_sql_name(constraint))
        ))
        .await
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.statistics \
             WHERE table_schema = {} AND table_name = {} AND index_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table)),
            lit(&to_sql_name(index))
        ))
        .await
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT data_type FROM information_schema.columns \
                 WHERE table_schema = {} AND table_name = {} AND column_name = {}",
                lit(&self.database),
                lit(&to_sql_name(table)),
                lit(&to_sql_name(column))
            ))
            .await?;
        Ok(rows.into_iter().next())
    }
}

pub struct PostgresInspector {
    driver: Arc<dyn Driver>,
}

impl PostgresInspector {
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    async fn count(&self, sql: String) -> Result<bool> {
        Ok(self.driver.fetch_count(&sql).await? > 0)
    }
}

#[async_trait]
impl Inspector for PostgresInspector {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name = {}",
            lit(&to_sql_name(table))
        ))
        .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = {} AND column_name = {}",
            lit(&to_sql_name(table)),
            lit(&to_sql_name(column))
        ))
        .await
    }

    async fn primary_key_exists(&self, table: &str) -> Result<bool> {
        Ok(self.primary_key_name(table).await?.is_some())
    }

    async fn primary_key_name(&self, table: &str) -> Result<Option<String>> {
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT constraint_name FROM information_schema.table_constraints \
                 WHERE table_schema = 'public' AND table_name = {} \
                 AND constraint_type = 'PRIMARY KEY'",
                lit(&to_sql_name(table))
            ))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.table_constraints \
             WHERE table_schema = 'public' AND table_name = {} \
             AND constraint_type = 'FOREIGN KEY' AND constraint_name = {}",
            lit(&to_sql_name(table)),
            lit(&to_sql_name(constraint))
        ))
        .await
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM pg_indexes \
             WHERE schemaname = 'public' AND tablename = {} AND indexname = {}",
            lit(&to_sql_name(table)),
            lit(&to_sql_name(index))
        ))
        .await
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT data_type FROM information_schema.columns \
                 WHERE table_schema = 'public' AND table_name = {} AND column_name = {}",
                lit(&to_sql_name(table)),
                lit(&to_sql_name(column))
            ))
            .await?;
        Ok(rows.into_iter().next())
    }
}

pub struct H2Inspector {
    driver: Arc<dyn Driver>,
    version: H2Version,
}

impl H2Inspector {
    pub fn new(driver: Arc<dyn Driver>, version: H2Version) -> Self {
        Self { driver, version }
    }

    fn ident(name: &str) -> String {
        lit(&to_sql_name(name).to_uppercase())
    }

    async fn count(&self, sql: String) -> Result<bool> {
        Ok(self.driver.fetch_count(&sql).await? > 0)
    }
}

#[async_trait]
impl Inspector for H2Inspector {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {}",
            Self::ident(table)
        ))
        .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} AND COLUMN_NAME = {}",
            Self::ident(table),
            Self::ident(column)
        ))
        .await
    }

    async fn primary_key_exists(&self, table: &str) -> Result<bool> {
        let sql = match self.version {
            H2Version::V1 => format!(
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.CONSTRAINTS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} \
                 AND CONSTRAINT_TYPE = 'PRIMARY KEY'",
                Self::ident(table)
            ),
            H2Version::V2 => format!(
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} \
                 AND CONSTRAINT_TYPE = 'PRIMARY KEY'",
                Self::ident(table)
            ),
        };
        self.count(sql).await
    }

    async fn primary_key_name(&self, table: &str) -> Result<Option<String>> {
        let sql = match self.version {
            H2Version::V1 => format!(
                "SELECT CONSTRAINT_NAME FROM INFORMATION_SCHEMA.CONSTRAINTS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} \
                 AND CONSTRAINT_TYPE = 'PRIMARY KEY'",
                Self::ident(table)
            ),
            H2Version::V2 => format!(
                "SELECT CONSTRAINT_NAME FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} \
                 AND CONSTRAINT_TYPE = 'PRIMARY KEY'",
                Self::ident(table)
            ),
        };
        Ok(self.driver.fetch_column(&sql).await?.into_iter().next())
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        let sql = match self.version {
            H2Version::V1 => format!(
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.CONSTRAINTS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} \
                 AND CONSTRAINT_TYPE = 'REFERENTIAL' AND CONSTRAINT_NAME = {}",
                Self::ident(table),
                Self::ident(constraint)
            ),
            H2Version::V2 => format!(
                "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} \
                 AND CONSTRAINT_TYPE = 'FOREIGN KEY' AND CONSTRAINT_NAME = {}",
                Self::ident(table),
                Self::ident(constraint)
            ),
        };
        self.count(sql).await
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.INDEXES \
             WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} AND INDEX_NAME = {}",
            Self::ident(table),
            Self::ident(index)
        ))
        .await
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        let type_column = match self.version {
            H2Version::V1 => "TYPE_NAME",
            H2Version::V2 => "DATA_TYPE",
        };
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT {} FROM INFORMATION_SCHEMA.COLUMNS \
                 WHERE TABLE_SCHEMA = SCHEMA() AND TABLE_NAME = {} AND COLUMN_NAME = {}",
                type_column,
                Self::ident(table),
                Self::ident(column)
            ))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn matching_foreign_keys(
        &self,
        fk_table: &str,
        fk_column: &str,
        pk_table: &str,
        pk_column: &str,
    ) -> Result<Vec<String>> {
        let sql = match self.version {
            H2Version::V1 => format!(
                "SELECT FK_NAME FROM INFORMATION_SCHEMA.CROSS_REFERENCES \
                 WHERE FKTABLE_NAME = {} AND FKCOLUMN_NAME = {} \
                 AND PKTABLE_NAME = {} AND PKCOLUMN_NAME = {}",
                Self::ident(fk_table),
                Self::ident(fk_column),
                Self::ident(pk_table),
                Self::ident(pk_column)
            ),
            H2Version::V2 => format!(
                "SELECT tc.CONSTRAINT_NAME \
                 FROM INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
                 JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS rc \
                   ON rc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                 JOIN INFORMATION_SCHEMA.CONSTRAINT_COLUMN_USAGE fkc \
                   ON fkc.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                 JOIN INFORMATION_SCHEMA.CONSTRAINT_COLUMN_USAGE pkc \
                   ON pkc.CONSTRAINT_NAME = rc.UNIQUE_CONSTRAINT_NAME \
                 WHERE tc.CONSTRAINT_TYPE = 'FOREIGN KEY' \
                 AND tc.TABLE_NAME = {} AND fkc.COLUMN_NAME = {} \
                 AND pkc.TABLE_NAME = {} AND pkc.COLUMN_NAME = {}",
                Self::ident(fk_table),
                Self::ident(fk_column),
                Self::ident(pk_table),
                Self::ident(pk_column)
            ),
        };
        self.driver.fetch_column(&sql).await
    }
}

pub struct SqlServerInspector {
    driver: Arc<dyn Driver>,
    database: String,
}

impl SqlServerInspector {
    pub fn new(driver: Arc<dyn Driver>, database: impl Into<String>) -> Self {
        Self { driver, database: database.into() }
    }

    async fn count(&self, sql: String) -> Result<bool> {
        Ok(self.driver.fetch_count(&sql).await? > 0)
    }
}

#[async_trait]
impl Inspector for SqlServerInspector {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_catalog = {} AND table_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table))
        ))
        .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_catalog = {} AND table_name = {} AND column_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table)),
            lit(&to_sql_name(column))
        ))
        .await
    }

    async fn primary_key_exists(&self, table: &str) -> Result<bool> {
        Ok(self.primary_key_name(table).await?.is_some())
    }

    async fn primary_key_name(&self, table: &str) -> Result<Option<String>> {
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT constraint_name FROM information_schema.table_constraints \
                 WHERE table_catalog = {} AND table_name = {} \
                 AND constraint_type = 'PRIMARY KEY'",
                lit(&self.database),
                lit(&to_sql_name(table))
            ))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM information_schema.table_constraints \
             WHERE table_catalog = {} AND table_name = {} \
             AND constraint_type = 'FOREIGN KEY' AND constraint_name = {}",
            lit(&self.database),
            lit(&to_sql_name(table)),
            lit(&to_sql_name(constraint))
        ))
        .await
    }

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        self.count(format!(
            "SELECT COUNT(*) FROM sys.indexes i \
             JOIN sys.tables t ON i.object_id = t.object_id \
             WHERE t.name = {} AND i.name = {}",
            lit(&to_sql_name(table)),
            lit(&to_sql_name(index))
        ))
        .await
    }

    async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        let rows = self
            .driver
            .fetch_column(&format!(
                "SELECT data_type FROM information_schema.columns \
                 WHERE table_catalog = {} AND table_name = {} AND column_name = {}",
                lit(&self.database),
                lit(&to_sql_name(table)),
                lit(&to_sql_name(column))
            ))
            .await?;
        Ok(rows.into_iter().next())
    }
}
