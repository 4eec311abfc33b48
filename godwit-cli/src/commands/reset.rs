//! Roll back every applied migration

use std::io::Write;

use anyhow::Result;
use colored::Colorize;

use godwit_core::Config;

use super::open_migrator;

pub async fn run(config: &Config, yes: bool) -> Result<()> {
    if !yes {
        print!("Roll back ALL applied migrations? [y/N] ");
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Reset cancelled.".yellow());
            return Ok(());
        }
    }

    let migrator = open_migrator(config).await?;
    let reverted = migrator.reset().await?;
    if reverted.is_empty() {
        println!("{}", "Nothing to reset.".green());
    } else {
        for version in &reverted {
            println!("  {} {}", "rolled back".cyan(), version.yellow());
        }
        println!(
            "{}",
            format!("✓ {} migration(s) rolled back", reverted.len()).green().bold()
        );
    }
    Ok(())
}
