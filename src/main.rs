use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogmate::config::Config;
use blogmate::models::Grade;

mod commands;

use commands::DiscoverParams;

#[derive(Parser)]
#[command(
    name = "blogmate",
    version,
    about = "Keyword research for bloggers: find rising long-tail keywords worth writing about",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover publishing opportunities around a seed keyword
    Discover {
        /// Seed keyword
        seed: String,

        /// Minimum grade to keep (S, A, B, C, D)
        #[arg(long)]
        min_grade: Option<Grade>,

        /// Skip autocomplete suggestions
        #[arg(long, default_value = "false")]
        no_autocomplete: bool,

        /// Ignore and do not write the result cache
        #[arg(long, default_value = "false")]
        no_cache: bool,

        /// Number of keywords to print
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Print the result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Compare the trends of up to five keywords
    Compare {
        /// Keywords to compare
        #[arg(required = true, num_args = 1..=5)]
        keywords: Vec<String>,

        /// Print the result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Inspect or clean the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache statistics and cached keywords
    Stats {
        /// Print statistics as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Remove every cache entry
    Clear,

    /// Remove expired cache entries
    ClearExpired,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Initialize tracing/logging
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, cli.verbose, &config.logging.level)?;

    tracing::info!("blogmate starting");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    if let Err(err) = run(cli.command, &config, cancel).await {
        if let Some(line) = commands::describe_error(&err) {
            eprintln!("{line}");
        }
        return Err(err);
    }

    tracing::info!("blogmate completed successfully");
    Ok(())
}

async fn run(command: Commands, config: &Config, cancel: CancellationToken) -> Result<()> {
    match command {
        Commands::Discover {
            seed,
            min_grade,
            no_autocomplete,
            no_cache,
            top,
            json,
        } => {
            tracing::info!(
                seed = %seed,
                min_grade = ?min_grade,
                no_autocomplete = %no_autocomplete,
                no_cache = %no_cache,
                "Starting discover command"
            );
            let params = DiscoverParams {
                seed,
                min_grade,
                no_autocomplete,
                no_cache,
                top,
                json,
            };
            commands::discover(config, params, cancel).await?;
        }

        Commands::Compare { keywords, json } => {
            tracing::info!(keywords = ?keywords, "Starting compare command");
            commands::compare(config, keywords, json).await?;
        }

        Commands::Cache { action } => match action {
            CacheAction::Stats { json } => commands::cache_stats(config, json)?,
            CacheAction::Clear => commands::cache_clear(config)?,
            CacheAction::ClearExpired => commands::cache_clear_expired(config)?,
        },
    }

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool, level: &str) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("blogmate=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("blogmate={level},warn")))
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
