//! # Compute Landscape CLI (`landscape`)
//!
//! Browse the compute segment catalog, edit saved research, run
//! intelligence-backed analysis, and start the HTTP API.
//!
//! ## Usage
//!
//! ```bash
//! landscape --config ./config/landscape.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `landscape segments` | List segments by category, marking researched ones |
//! | `landscape show <id>` | Segment details and its saved analysis |
//! | `landscape set <id> --file F` | Replace a segment's analysis from JSON |
//! | `landscape clear <id>` | Remove a segment's analysis |
//! | `landscape reset` | Restore the bundled default research |
//! | `landscape export` | Write all research as JSON |
//! | `landscape import F` | Merge (or replace) research from JSON |
//! | `landscape overview` | Category rollups |
//! | `landscape analyze <id> --notes F` | Extract an analysis from notes and save it |
//! | `landscape bulk --narrative F` | Extract analyses for many segments at once |
//! | `landscape ask <id> "<q>"` | Web-grounded question about a segment |
//! | `landscape search "<q>"` | Open market question |
//! | `landscape chat <id> "<q>"` | Question answered from saved research |
//! | `landscape serve` | Start the HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! # Which photonic players are tracked?
//! landscape show ep-photonic
//!
//! # Turn analyst notes into a saved analysis, merging with what is there
//! landscape analyze si-wafer --notes notes/cerebras.md --merge --dedup by-name
//!
//! # Back up everything
//! landscape export --output backup.json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use compute_landscape::core::research::DedupPolicy;
use compute_landscape::{analyze, ask, config, logging, overview, research_cmd, server};

/// Compute Landscape CLI: research workbench for the AI-compute chip market.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "landscape",
    about = "Compute Landscape: segment catalog, research store and market intelligence",
    version,
    long_about = "Compute Landscape tracks thirteen AI-compute chip architecture segments. \
    Each segment carries a saved analysis of companies, summary and trends that can be edited \
    directly or extracted from research notes by a generative language service."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/landscape.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// List catalog segments grouped by category.
    ///
    /// Segments with saved research are marked with `*`.
    Segments {
        /// Only this category (label or slug, e.g. `emerging-physics`).
        #[arg(long)]
        category: Option<String>,
    },

    /// Show a segment and its saved analysis.
    Show {
        /// Segment id (e.g. `si-wafer`).
        id: String,
    },

    /// Replace a segment's analysis with a JSON document.
    ///
    /// The document must contain `companies`, `summary` and `trends`.
    Set {
        /// Segment id.
        id: String,

        /// JSON file to read, or `-` for stdin.
        #[arg(long)]
        file: PathBuf,
    },

    /// Remove a segment's analysis.
    ///
    /// The segment then reads as having no research, not an empty record.
    Clear {
        /// Segment id.
        id: String,
    },

    /// Discard all saved research and restore the bundled defaults.
    Reset,

    /// Export all saved research as JSON.
    Export {
        /// Write to this file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Import research from a JSON export or a bare `{ id: analysis }` map.
    Import {
        /// File to read, or `-` for stdin.
        file: PathBuf,

        /// Company deduplication when merging: `keep-all` or `by-name`.
        #[arg(long, default_value = "by-name")]
        dedup: DedupPolicy,

        /// Overwrite each imported segment instead of merging.
        #[arg(long)]
        replace: bool,
    },

    /// Show the market overview by category.
    Overview,

    /// Extract an analysis from research notes and save it.
    ///
    /// Nothing is saved if the intelligence service fails.
    Analyze {
        /// Segment id.
        id: String,

        /// Notes file, or `-` for stdin.
        #[arg(long)]
        notes: PathBuf,

        /// Merge into the existing analysis instead of replacing it.
        #[arg(long)]
        merge: bool,

        /// Company deduplication when merging: `keep-all` or `by-name`.
        #[arg(long, default_value = "keep-all")]
        dedup: DedupPolicy,
    },

    /// Extract analyses for many segments from one market narrative.
    ///
    /// Results are merged into the saved research.
    Bulk {
        /// Narrative file, or `-` for stdin.
        #[arg(long)]
        narrative: PathBuf,

        /// Limit to these segment ids (repeatable). Defaults to all.
        #[arg(long = "segment")]
        segments: Vec<String>,

        /// Company deduplication: `keep-all` or `by-name`.
        #[arg(long, default_value = "by-name")]
        dedup: DedupPolicy,
    },

    /// Ask a web-grounded question about a segment.
    Ask {
        /// Segment id.
        id: String,
        /// The question.
        query: String,
    },

    /// Ask an open question about the market.
    Search {
        /// The question.
        query: String,
    },

    /// Ask about a segment, answered from its saved research.
    Chat {
        /// Segment id.
        id: String,
        /// The question.
        query: String,
    },

    /// Start the HTTP API.
    ///
    /// Binds to the address configured in `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config_or_default(&cli.config)?;
    logging::init(&cfg.logging, cli.verbose);

    match cli.command {
        Commands::Segments { category } => {
            research_cmd::run_segments(&cfg, category.as_deref())?;
        }
        Commands::Show { id } => {
            research_cmd::run_show(&cfg, &id)?;
        }
        Commands::Set { id, file } => {
            research_cmd::run_set(&cfg, &id, &file)?;
        }
        Commands::Clear { id } => {
            research_cmd::run_clear(&cfg, &id)?;
        }
        Commands::Reset => {
            research_cmd::run_reset(&cfg)?;
        }
        Commands::Export { output } => {
            research_cmd::run_export(&cfg, output.as_deref())?;
        }
        Commands::Import {
            file,
            dedup,
            replace,
        } => {
            research_cmd::run_import(&cfg, &file, dedup, replace)?;
        }
        Commands::Overview => {
            overview::run_overview(&cfg)?;
        }
        Commands::Analyze {
            id,
            notes,
            merge,
            dedup,
        } => {
            analyze::run_analyze(&cfg, &id, &notes, merge, dedup).await?;
        }
        Commands::Bulk {
            narrative,
            segments,
            dedup,
        } => {
            analyze::run_bulk(&cfg, &narrative, &segments, dedup).await?;
        }
        Commands::Ask { id, query } => {
            ask::run_ask(&cfg, &id, &query).await?;
        }
        Commands::Search { query } => {
            ask::run_search(&cfg, &query).await?;
        }
        Commands::Chat { id, query } => {
            ask::run_chat(&cfg, &id, &query).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
