//! Read-only introspection of the live database.
//!
//! Each backend answers existence questions against its own catalog views;
//! the per-backend query builders live in the [`backends`] submodule. An
//! absent inspector means "assume empty schema": every check returns false,
//! which is what dry runs and compiler tests want.

use async_trait::async_trait;

use crate::error::Result;
use crate::plan::Plan;

pub mod backends;

/// Existence questions the dialect compilers ask about the live schema.
#[async_trait]
pub trait Inspector: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    async fn column_exists(&self, table: &str, column: &str) -> Result<bool>;

    async fn primary_key_exists(&self, table: &str) -> Result<bool>;

    /// The primary-key constraint name, needed by the drop-PK paths on
    /// PostgreSQL and SQL Server.
    async fn primary_key_name(&self, table: &str) -> Result<Option<String>>;

    async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool>;

    async fn index_exists(&self, table: &str, index: &str) -> Result<bool>;

    /// Declared type of a column, when the backend needs it (H2 index
    /// column filtering).
    async fn column_type(&self, _table: &str, _column: &str) -> Result<Option<String>> {
        Ok(None)
    }

    /// Names of foreign keys covering the given (fktable, fkcol) ->
    /// (pktable, pkcol) tuple. Only H2 consults this.
    async fn matching_foreign_keys(
        &self,
        _fk_table: &str,
        _fk_column: &str,
        _pk_table: &str,
        _pk_column: &str,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Ambient compile-time state: the (optional) live inspector plus the plan
/// of commands already compiled in this migration.
pub struct CompileContext<'a> {
    pub inspector: Option<&'a dyn Inspector>,
    pub plan: &'a Plan,
}

impl<'a> CompileContext<'a> {
    pub fn new(inspector: Option<&'a dyn Inspector>, plan: &'a Plan) -> Self {
        Self { inspector, plan }
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        match self.inspector {
            Some(i) => i.table_exists(table).await,
            None => Ok(false),
        }
    }

    pub async fn column_exists(&self, table: &str, column: &str) -> Result<bool> {
        match self.inspector {
            Some(i) => i.column_exists(table, column).await,
            None => Ok(false),
        }
    }

    pub async fn primary_key_exists(&self, table: &str) -> Result<bool> {
        match self.inspector {
            Some(i) => i.primary_key_exists(table).await,
            None => Ok(false),
        }
    }

    pub async fn primary_key_name(&self, table: &str) -> Result<Option<String>> {
        match self.inspector {
            Some(i) => i.primary_key_name(table).await,
            None => Ok(None),
        }
    }

    pub async fn foreign_key_exists(&self, table: &str, constraint: &str) -> Result<bool> {
        match self.inspector {
            Some(i) => i.foreign_key_exists(table, constraint).await,
            None => Ok(false),
        }
    }

    pub async fn index_exists(&self, table: &str, index: &str) -> Result<bool> {
        match self.inspector {
            Some(i) => i.index_exists(table, index).await,
            None => Ok(false),
        }
    }

    pub async fn column_type(&self, table: &str, column: &str) -> Result<Option<String>> {
        match self.inspector {
            Some(i) => i.column_type(table, column).await,
            None => Ok(None),
        }
    }

    pub async fn matching_foreign_keys(
        &self,
        fk_table: &str,
        fk_column: &str,
        pk_table: &str,
        pk_column: &str,
    ) -> Result<Vec<String>> {
        match self.inspector {
            Some(i) => {
                i.matching_foreign_keys(fk_table, fk_column, pk_table, pk_column)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }
}
