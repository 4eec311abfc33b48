//! godwit - declarative schema migrations

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod util;

use godwit_core::Config;

#[derive(Parser, Debug)]
#[command(name = "godwit")]
#[command(author, version, about = "Declarative schema migrations for SQL databases")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "godwit.json")]
    config: PathBuf,

    /// Database URL overriding the configured connection
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the version table (and database, where supported)
    Init,
    /// Print the highest recorded version
    Version,
    /// Print all recorded versions
    Versions,
    /// Apply pending migrations
    Migrate {
        /// Restrict to these versions (comma/space/semicolon separated)
        only_versions: Option<String>,
    },
    /// Roll back the newest applied migration
    Rollback,
    /// Roll back every applied migration
    Reset {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Print file versions absent from the registry
    Missing,
    /// Create a new timestamped migration file
    New { name: String },
    /// Echo the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "godwit=debug,info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(url) = &cli.url {
        util::apply_url(&mut config, url)?;
    }
    if !config.color {
        colored::control::set_override(false);
    }

    match &cli.command {
        Commands::Init => commands::init::run(&config).await,
        Commands::Version => commands::status::version(&config).await,
        Commands::Versions => commands::status::versions(&config).await,
        Commands::Migrate { only_versions } => {
            commands::migrate::run(&config, only_versions.as_deref()).await
        }
        Commands::Rollback => commands::rollback::run(&config).await,
        Commands::Reset { yes } => commands::reset::run(&config, *yes).await,
        Commands::Missing => commands::status::missing(&config).await,
        Commands::New { name } => commands::new::run(&config, name),
        Commands::Config => commands::config::run(&config),
    }
}
