//! Apply pending migrations

use anyhow::Result;
use colored::Colorize;

use godwit_core::Config;

use super::open_migrator;

/// Split an `only-versions` argument on commas, semicolons, and whitespace.
fn parse_only(arg: &str) -> Vec<String> {
    arg.split([',', ';', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn run(config: &Config, only_versions: Option<&str>) -> Result<()> {
    println!("{}", "Migrating:".cyan().bold());

    let migrator = open_migrator(config).await?;
    let only = only_versions.map(parse_only);
    let applied = migrator.migrate(only.as_deref()).await?;

    if applied.is_empty() {
        println!("{}", "No migrations to apply.".green());
        return Ok(());
    }
    for (i, version) in applied.iter().enumerate() {
        println!(
            "  {} {}",
            format!("[{}/{}]", i + 1, applied.len()).cyan(),
            version.yellow()
        );
    }
    println!(
        "{}",
        format!("✓ {} migration(s) applied", applied.len()).green().bold()
    );
    Ok(())
}
