//! Roll back the newest applied migration

use anyhow::Result;
use colored::Colorize;

use godwit_core::Config;

use super::open_migrator;

pub async fn run(config: &Config) -> Result<()> {
    println!("{}", "Rolling back:".cyan().bold());

    let migrator = open_migrator(config).await?;
    match migrator.rollback().await? {
        Some(version) => {
            println!("{} {}", "✓ Rolled back".green().bold(), version.yellow());
        }
        None => println!("{}", "No migrations to roll back.".green()),
    }
    Ok(())
}
