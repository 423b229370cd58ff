//! # flyerdeck CLI
//!
//! The `flyerdeck` binary is the primary interface for the edition
//! tracker. It provides commands for store initialization, source
//! listing, running the sync pipeline, and inspecting the persisted
//! document.
//!
//! ## Usage
//!
//! ```bash
//! flyerdeck --config ./config/flyerdeck.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `flyerdeck init` | Create the images directory and an empty document |
//! | `flyerdeck sources` | List configured sources and record health |
//! | `flyerdeck sync <source\|all>` | Fetch, validate, detect, and promote editions |
//! | `flyerdeck status` | Per-source edition overview |
//! | `flyerdeck show <source>` | One source record in detail |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flyerdeck::{config, orchestrate, show, sources, stats, store};

/// flyerdeck — a flyer edition tracker for retail sources.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/flyerdeck.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "flyerdeck",
    about = "flyerdeck — a flyer edition tracker for retail sources",
    version,
    long_about = "flyerdeck maintains a current and a past edition of flyer-page images per \
    configured source. Each run fetches candidate pages, filters out noise, detects whether \
    the result is a genuinely new edition, and archives the outgoing one before promoting it."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/flyerdeck.toml`. All store, fetch,
    /// validation, detection, and source settings are read from this file.
    #[arg(long, global = true, default_value = "./config/flyerdeck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the store.
    ///
    /// Creates the images directory and an empty document. This command
    /// is idempotent — running it multiple times is safe.
    Init,

    /// List configured sources and their record health.
    ///
    /// Shows each source's acquisition strategy and whether its persisted
    /// record is new, empty, healthy, or degraded. Useful for verifying
    /// configuration before running a sync.
    Sources,

    /// Run the sync pipeline.
    ///
    /// Acquires candidate pages per source, fetches and validates them
    /// concurrently, compares the result against the stored current
    /// edition, and on a changed verdict archives the outgoing edition
    /// and promotes the new one. The document is written once at the end.
    Sync {
        /// Source specifier: `all` or a configured source name.
        source: String,

        /// Treat every non-empty candidate edition as changed.
        #[arg(long)]
        force: bool,

        /// Fetch and validate, report verdicts, but move nothing and
        /// leave the document untouched.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print a per-source overview of the persisted document.
    Status,

    /// Print one source record in detail.
    Show {
        /// A configured source name.
        source: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            store::init_store(&cfg.store.document, &cfg.store.images_dir)?;
            println!("Store initialized successfully.");
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Sync {
            source,
            force,
            dry_run,
        } => {
            let summary = orchestrate::run_sync(&cfg, &source, force, dry_run).await?;
            if summary.failed() > 0 {
                std::process::exit(1);
            }
        }
        Commands::Status => {
            stats::run_status(&cfg)?;
        }
        Commands::Show { source } => {
            show::run_show(&cfg, &source)?;
        }
    }

    Ok(())
}
