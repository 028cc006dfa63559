//! # Dataset Query CLI (`dsq`)
//!
//! The `dsq` binary serves JSON datasets over HTTP and runs one-shot
//! queries from the terminal.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dsq serve` | Start the HTTP query server |
//! | `dsq categories` | List catalog categories and storage health |
//! | `dsq resolve <keyword>` | Show which category a keyword maps to |
//! | `dsq parse "<question>"` | Show the category and filters derived from a question |
//! | `dsq get <keyword>` | Load a category, optionally `--filter` it |
//! | `dsq folder <name>` | Load a storage folder by literal name |
//! | `dsq ask "<question>"` | Answer a free-text question |
//! | `dsq search <term>` | Filter every record under the data root |
//!
//! ## Examples
//!
//! ```bash
//! DSQ_DATA_ROOT=/srv/backup-data dsq serve
//! dsq get sanpham --filter "táo"
//! dsq ask "KPI của Cửa Hàng Kim Khí Kim Phương (Phù Cát) tháng 5"
//! ```

use clap::{Parser, Subcommand};
use dataset_query::{categories, commands, config, logging, server};
use std::path::PathBuf;

/// Dataset Query: a read-only query service for JSON-backed datasets.
#[derive(Parser)]
#[command(
    name = "dsq",
    about = "Dataset Query: read-only keyword and question queries over JSON datasets",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/dsq.toml`. A missing file means built-in
    /// defaults. `DSQ_DATA_ROOT` overrides `[data].root` either way.
    #[arg(long, global = true, default_value = "./config/dsq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP query server on `[server].bind`.
    Serve,

    /// List catalog categories, their storage, and whether it exists.
    Categories,

    /// Resolve a keyword to its category (exact match).
    Resolve {
        keyword: String,
    },

    /// Parse a question into a category and filter terms without loading data.
    Parse {
        question: String,
    },

    /// Load the category a keyword resolves to.
    Get {
        keyword: String,

        /// Keep only records containing this term (whitespace/case-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },

    /// Load a storage folder by its literal name under the data root.
    Folder {
        name: String,

        /// Keep only records containing this term (accent-insensitive).
        #[arg(long)]
        filter: Option<String>,
    },

    /// Answer a free-text question.
    Ask {
        question: String,
    },

    /// Filter every record under the data root.
    Search {
        term: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Categories => {
            categories::list_categories(&cfg)?;
        }
        Commands::Resolve { keyword } => {
            commands::run_resolve(&cfg, &keyword)?;
        }
        Commands::Parse { question } => {
            commands::run_parse(&cfg, &question)?;
        }
        Commands::Get { keyword, filter } => {
            commands::run_get(&cfg, &keyword, filter.as_deref()).await?;
        }
        Commands::Folder { name, filter } => {
            commands::run_folder(&cfg, &name, filter.as_deref()).await?;
        }
        Commands::Ask { question } => {
            commands::run_ask(&cfg, &question).await?;
        }
        Commands::Search { term } => {
            commands::run_search(&cfg, &term).await?;
        }
    }

    Ok(())
}
