//! Version-table bootstrap

use anyhow::Result;
use colored::Colorize;

use godwit_core::Config;

use super::open_migrator;

pub async fn run(config: &Config) -> Result<()> {
    let migrator = open_migrator(config).await?;
    migrator.init().await?;
    println!(
        "{} {}",
        "✓ Initialized version table:".green().bold(),
        config.version_table.yellow()
    );
    Ok(())
}
