//! # Character DB CLI (`chara`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `chara init` | Create the SQLite database and schema |
//! | `chara import [path]` | Import scraped character JSON |
//! | `chara search [query]...` | Search by name, optionally ranked by a metric |
//! | `chara get <no>` | Show one character with all metrics |
//! | `chara stats` | Summarize the database |
//! | `chara serve` | Start the HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! chara init --config ./config/chara.toml
//! chara import ./data/characters.json
//! chara search "円堂" "ごうえんじ" --sort shootAT
//! chara search --page 3
//! ```

use chara_db::{config, get, ingest, metrics::MetricKey, migrate, search, server, stats};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Character DB CLI: import, search, and rank scraped character sheets.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "chara",
    about = "Character DB: import, search, and rank scraped character sheets",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/chara.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Import scraped character JSON into the database.
    ///
    /// Rows are upserted by character number; unchanged rows are skipped.
    Import {
        /// JSON file to import. Defaults to `[import].path`.
        path: Option<PathBuf>,

        /// Show counts without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Search characters by name or reading.
    ///
    /// Spaces (half- and full-width) are ignored. With several queries the
    /// results are appended, dropping characters already listed.
    Search {
        /// Search queries. No query lists everything.
        queries: Vec<String>,

        /// Page to show (1-based). Out-of-range pages are clamped.
        #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
        page: f64,

        /// Rank the listed rows by this metric (e.g. `totalStatus`, `KP`).
        #[arg(long)]
        sort: Option<MetricKey>,

        /// Hide this character number from the listing (repeatable).
        #[arg(long)]
        exclude: Vec<i64>,
    },

    /// Show one character by number.
    Get {
        /// Character number.
        no: i64,
    },

    /// Show database statistics.
    Stats,

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chara_db=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { path, dry_run } => {
            ingest::run_import(&cfg, path, dry_run).await?;
        }
        Commands::Search {
            queries,
            page,
            sort,
            exclude,
        } => {
            search::run_search(&cfg, &queries, page, sort, &exclude).await?;
        }
        Commands::Get { no } => {
            get::run_get(&cfg, no).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
