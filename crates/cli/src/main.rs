use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hunter_core::{
    load_config, validate_config, Config, GuessHints, MediaStore, QualityCatalog,
    QualityGuesser, SqliteMediaStore,
};

#[derive(Debug, Parser)]
#[command(name = "hunter", version, about = "Inspect release quality detection and configuration")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "HUNTER_CONFIG", default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Guess the quality of one release from its file names
    Guess {
        #[arg(required = true)]
        names: Vec<String>,
        /// Release size in MB
        #[arg(long)]
        size: Option<u64>,
        /// Video width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Video height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Print the full score table as JSON
        #[arg(long)]
        scores: bool,
    },
    /// List quality tiers, best first
    Catalog,
    /// Load and validate the configuration
    CheckConfig,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Guess {
            names,
            size,
            width,
            height,
            scores,
        } => {
            let config = load_or_default(&cli.config)?;
            let catalog = load_catalog(&config)?;
            let guesser = QualityGuesser::new(Arc::new(catalog));
            let hints = GuessHints {
                size_mb: size,
                width,
                height,
            };

            if scores {
                let table = guesser.score(&names, hints);
                let json: serde_json::Map<String, serde_json::Value> = table
                    .entries()
                    .iter()
                    .map(|entry| (entry.identifier.clone(), serde_json::json!(entry.score)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            }

            match guesser.guess(&names, hints) {
                Some(guess) => println!(
                    "{} ({}){}",
                    guess.tier.label,
                    guess.identifier(),
                    if guess.is_3d { " 3D" } else { "" }
                ),
                None => println!("no confident guess"),
            }
        }
        Command::Catalog => {
            let config = load_or_default(&cli.config)?;
            let catalog = load_catalog(&config)?;
            for tier in catalog.all() {
                println!(
                    "{:>2}  {:<8} {:<10} {:>6}-{:<6} MB{}{}",
                    tier.order,
                    tier.identifier,
                    tier.label,
                    tier.size_min,
                    tier.size_max,
                    if tier.hd { "  hd" } else { "" },
                    if tier.allows_3d { "  3d" } else { "" }
                );
            }
        }
        Command::CheckConfig => {
            info!("Loading configuration from {:?}", cli.config);
            let config = load_config(&cli.config)
                .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
            validate_config(&config).context("Configuration validation failed")?;

            info!("Configuration loaded successfully");
            info!("Database path: {:?}", config.database.path);
            info!(
                "Search interval: {}s (enabled: {})",
                config.orchestrator.search_interval_secs, config.orchestrator.enabled
            );
            println!("configuration ok");
        }
    }

    Ok(())
}

/// The configuration at `path`, or defaults when the file does not exist.
fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No configuration at {:?}, using defaults", path);
        return Ok(Config::default());
    }
    let config =
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

/// The built-in catalog with any size overrides from an existing database.
fn load_catalog(config: &Config) -> Result<QualityCatalog> {
    let mut catalog = QualityCatalog::builtin().context("Failed to load quality catalog")?;

    if config.database.path.exists() {
        let store = SqliteMediaStore::new(&config.database.path)
            .with_context(|| format!("Failed to open database {:?}", config.database.path))?;
        let overrides = store
            .quality_sizes()
            .context("Failed to read quality size overrides")?;
        catalog
            .apply_size_overrides(&overrides)
            .context("Invalid quality size override")?;
    }

    Ok(catalog)
}
