mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use thoughtlocker::{DEFAULT_SEARCH_LIMIT, SearchQuery};
use thoughtlocker_store::Locker;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "thoughtlocker")]
#[command(about = "Store, version and look up prompt specifications")]
struct Cli {
    /// Path to the prompt database
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log filter, e.g. `info` or `thoughtlocker_store=debug`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load prompt specs from a YAML file, skipping unchanged ones
    Seed {
        /// YAML file mapping prompt names to their fields
        #[arg(long)]
        yaml: PathBuf,
    },
    /// Print a prompt's system instruction
    Get {
        /// Prompt name or alias
        name: String,
        /// Print the full record as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// List stored prompts
    List {
        /// Only enabled prompts
        #[arg(long, conflicts_with = "disabled")]
        enabled: bool,
        /// Only disabled prompts
        #[arg(long)]
        disabled: bool,
    },
    /// Search prompts by text, tags and provider
    Search {
        /// Substring of name, description or system instruction
        query: Option<String>,
        /// Required tag (repeatable; all must match)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Exact provider
        #[arg(long)]
        provider: Option<String>,
        /// Maximum number of results
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Show the version history of a prompt
    History {
        /// Prompt name
        name: String,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn db_path(cli_path: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    let path = match cli_path.or_else(|| config.db_path.clone()) {
        Some(path) => path,
        None => config::default_db_path().context("could not determine data directory")?,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create database directory: {}", parent.display()))?;
    }

    Ok(path)
}

fn enabled_filter(enabled: bool, disabled: bool) -> Option<bool> {
    match (enabled, disabled) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let app_config = config::load_config();

    let log_level = cli
        .log_level
        .as_deref()
        .or(app_config.log_level.as_deref())
        .unwrap_or("info");
    init_tracing(log_level);

    let path = db_path(cli.db, &app_config)?;
    let locker = Locker::open(&path)
        .with_context(|| format!("failed to open prompt database: {}", path.display()))?;

    let result = match cli.command {
        Command::Seed { yaml } => commands::seed::run(&locker, &yaml),
        Command::Get { name, json } => commands::get::run(&locker, &name, json),
        Command::List { enabled, disabled } => {
            commands::list::run(&locker, enabled_filter(enabled, disabled))
        }
        Command::Search {
            query,
            tags,
            provider,
            limit,
        } => {
            let query = SearchQuery {
                text: query,
                tags,
                provider,
                limit,
            };
            commands::search::run(&locker, &query)
        }
        Command::History { name } => commands::history::run(&locker, &name),
    };

    locker.close();
    result
}
