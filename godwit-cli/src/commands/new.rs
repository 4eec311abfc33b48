//! Migration file creation

use anyhow::Result;
use colored::Colorize;

use godwit_core::{Config, MigrationStore};

pub fn run(config: &Config, name: &str) -> Result<()> {
    let store = MigrationStore::new(&config.migration_dir);
    let path = store.create(name)?;
    println!("{} {}", "✓ Created:".green().bold(), path.display());
    println!("  Edit the file to add up and down commands, then run {}", "godwit migrate".cyan());
    Ok(())
}
