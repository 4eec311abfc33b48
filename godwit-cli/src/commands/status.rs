//! Registry queries: version, versions, missing

use anyhow::Result;
use colored::Colorize;

use godwit_core::Config;

use super::open_migrator;

pub async fn version(config: &Config) -> Result<()> {
    let migrator = open_migrator(config).await?;
    match migrator.current_version().await? {
        Some(version) => println!("{}", version),
        None => println!("{}", "No migrations applied.".dimmed()),
    }
    Ok(())
}

pub async fn versions(config: &Config) -> Result<()> {
    let migrator = open_migrator(config).await?;
    let versions = migrator.versions().await?;
    if versions.is_empty() {
        println!("{}", "No migrations applied.".dimmed());
    }
    for version in versions {
        println!("{}", version);
    }
    Ok(())
}

pub async fn missing(config: &Config) -> Result<()> {
    let migrator = open_migrator(config).await?;
    let missing = migrator.missing().await?;
    if missing.is_empty() {
        println!("{}", "No missing migrations.".green());
    }
    for version in missing {
        println!("{}", version.yellow());
    }
    Ok(())
}
