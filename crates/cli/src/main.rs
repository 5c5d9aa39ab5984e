//! Studbook CLI: the main entry point.
//!
//! Commands:
//! - `generate` : Build a sale catalog PDF for one or more horses
//! - `estimate` : Predict how long a catalog of N pages will take
//! - `cache`    : Inspect, prune or clear the document cache
//! - `token`    : Show the cached report-signing token
//! - `config`   : Show or validate the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "studbook",
    about = "Studbook: sale-catalog pages from registry pedigree data",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a catalog PDF, one page per horse
    Generate {
        /// Registry ids of the horses, in catalog order
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Number hips sequentially from this value
        #[arg(long, conflicts_with_all = ["auto_hip", "hips"])]
        hip: Option<u32>,

        /// Number hips 1, 2, 3, ...
        #[arg(long, conflicts_with = "hips")]
        auto_hip: bool,

        /// Explicit hip labels, comma separated (leave a label empty to omit it)
        #[arg(long, value_delimiter = ',')]
        hips: Option<Vec<String>>,

        /// Expand broodmare produce for every dam on the page
        #[arg(long)]
        full_pedigree: bool,

        /// Where to write the PDF (defaults to a name derived from the horses)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Remove a run marker left behind by a crashed process
        #[arg(long)]
        force_unlock: bool,
    },

    /// Estimate run time from previous runs
    Estimate {
        /// Number of catalog pages
        pages: u64,
    },

    /// Document cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show the report-signing token (masked)
    Token {
        /// Print the token in full
        #[arg(long)]
        reveal: bool,
    },

    /// Show the effective configuration
    Config {
        /// Only check that the configuration loads
        #[arg(long)]
        validate: bool,
    },
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum CacheAction {
    /// Show entry counts for the active backend
    Stats,
    /// Delete expired entries
    Prune,
    /// Delete every entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate {
            ids,
            hip,
            auto_hip,
            hips,
            full_pedigree,
            output,
            force_unlock,
        } => {
            let args = commands::generate::GenerateArgs {
                ids,
                hips: commands::generate::hip_numbers(hip, auto_hip, hips),
                full_pedigree,
                output,
                force_unlock,
            };
            commands::generate::run(args).await?
        }
        Commands::Estimate { pages } => commands::estimate::run(pages).await?,
        Commands::Cache { action } => match action {
            CacheAction::Stats => commands::cache::stats().await?,
            CacheAction::Prune => commands::cache::prune().await?,
            CacheAction::Clear => commands::cache::clear().await?,
        },
        Commands::Token { reveal } => commands::token::run(reveal).await?,
        Commands::Config { validate } => {
            if validate {
                commands::config_cmd::validate().await?
            } else {
                commands::config_cmd::show().await?
            }
        }
    }

    Ok(())
}
