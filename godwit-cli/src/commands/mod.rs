//! One module per subcommand, each exposing a `run`-style entry point.

pub mod config;
pub mod init;
pub mod migrate;
pub mod new;
pub mod reset;
pub mod rollback;
pub mod status;

use anyhow::Result;

use godwit_core::{connect_driver, BackendRegistry, Config, Migrator};

/// Connect the configured backend and assemble a migrator.
pub async fn open_migrator(config: &Config) -> Result<Migrator> {
    let driver = connect_driver(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect: {}", e))?;
    let migrator = BackendRegistry::standard().open(config, driver).await?;
    Ok(migrator)
}
