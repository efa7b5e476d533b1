//! Example: Custom Compute Landscape binary with an offline intelligence provider.
//!
//! Demonstrates implementing the [`Intelligence`] trait without any network
//! calls. `DirectoryIntelligence` reads a JSON directory of known companies and
//! "extracts" an analysis by finding which of them are mentioned in the notes.
//!
//! # Running
//!
//! ```bash
//! # 1. Create a company directory
//! cat > /tmp/directory.json << 'EOF'
//! [
//!   { "name": "Cerebras", "specialization": "WSE-3",
//!     "description": "Wafer-scale engine with on-wafer SRAM.", "trends": ["Wafer-level memory"] },
//!   { "name": "Lightmatter", "specialization": "Passage",
//!     "description": "Photonic interconnect for chiplets.", "trends": ["Optical I/O"] },
//!   { "name": "Mythic", "specialization": "M1076 AMP",
//!     "description": "Analog compute-in-memory for edge inference.", "trends": [] }
//! ]
//! EOF
//!
//! # 2. Write some notes
//! echo "Cerebras shipped WSE-3 systems to two national labs." > /tmp/notes.md
//!
//! # 3. Analyze a segment with the offline provider
//! cargo run --example custom_intelligence -- \
//!   --directory /tmp/directory.json \
//!   analyze si-wafer --notes /tmp/notes.md
//!
//! # 4. Serve the HTTP API backed by the offline provider
//! cargo run --example custom_intelligence -- --directory /tmp/directory.json serve
//! curl -s -X POST http://localhost:7340/segments/ep-photonic/analyze \
//!   -H 'Content-Type: application/json' \
//!   -d '{"notes": "Lightmatter raised again.", "merge": true, "dedup": "by-name"}' | jq .
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use compute_landscape::analyze::{analyze_notes, RequestError, SaveMode};
use compute_landscape::config;
use compute_landscape::core::intelligence::{Intelligence, IntelligenceError};
use compute_landscape::core::models::{
    Company, ContextualAnswer, FreeTextAnswer, SavedResearch, SegmentAnalysis,
};
use compute_landscape::server::run_server_with_intelligence;
use compute_landscape::storage_fs::open_store;

// ═══════════════════════════════════════════════════════════════════════
// Directory-backed intelligence
// ═══════════════════════════════════════════════════════════════════════

/// One entry of the company directory.
#[derive(Deserialize, Clone)]
struct DirectoryEntry {
    name: String,
    specialization: String,
    description: String,
    #[serde(default)]
    trends: Vec<String>,
}

/// Extracts analyses by matching known company names in the text.
struct DirectoryIntelligence {
    entries: Vec<DirectoryEntry>,
}

impl DirectoryIntelligence {
    fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory: {}", path.display()))?;
        let entries: Vec<DirectoryEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse directory: {}", path.display()))?;
        Ok(Self { entries })
    }

    fn mentioned<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a DirectoryEntry> + 'a {
        let lower = text.to_lowercase();
        self.entries
            .iter()
            .filter(move |e| lower.contains(&e.name.to_lowercase()))
    }

    fn extract(&self, segment_title: &str, text: &str) -> SegmentAnalysis {
        let hits: Vec<&DirectoryEntry> = self.mentioned(text).collect();
        let mut trends: Vec<String> = Vec::new();
        for t in hits.iter().flat_map(|e| e.trends.iter()) {
            if !trends.contains(t) {
                trends.push(t.clone());
            }
        }
        SegmentAnalysis {
            companies: hits
                .iter()
                .map(|e| Company::new(&e.name, &e.specialization, &e.description))
                .collect(),
            summary: format!(
                "{} known companies mentioned in notes on {}.",
                hits.len(),
                segment_title
            ),
            trends,
        }
    }
}

#[async_trait]
impl Intelligence for DirectoryIntelligence {
    fn name(&self) -> &str {
        "directory"
    }

    async fn free_text_query(&self, query: &str) -> Result<FreeTextAnswer, IntelligenceError> {
        let names: Vec<String> = self.mentioned(query).map(|e| e.name.clone()).collect();
        Ok(FreeTextAnswer {
            answer_text: format!("Directory matches: {}", names.len()),
            related_topics: names,
        })
    }

    async fn contextual_query(
        &self,
        topic: &str,
        _query: &str,
    ) -> Result<ContextualAnswer, IntelligenceError> {
        Ok(ContextualAnswer {
            answer_text: format!("The offline directory has no web sources for {}.", topic),
            citations: Vec::new(),
        })
    }

    async fn structured_extract(
        &self,
        segment_title: &str,
        raw_text: &str,
    ) -> Result<SegmentAnalysis, IntelligenceError> {
        Ok(self.extract(segment_title, raw_text))
    }

    async fn bulk_extract(
        &self,
        narrative: &str,
        segment_ids: &[String],
    ) -> Result<SavedResearch, IntelligenceError> {
        // The directory does not know which segment a company belongs to.
        let _ = (narrative, segment_ids);
        Ok(SavedResearch::new())
    }

    async fn assistant_query(
        &self,
        _topic: &str,
        context: &str,
        _query: &str,
    ) -> Result<String, IntelligenceError> {
        Ok(context.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// CLI
// ═══════════════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "custom-landscape")]
struct Cli {
    #[arg(long, default_value = "./config/landscape.toml")]
    config: PathBuf,

    /// Company directory JSON.
    #[arg(long)]
    directory: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one segment's notes with the directory provider.
    Analyze {
        id: String,
        #[arg(long)]
        notes: PathBuf,
    },
    /// Serve the HTTP API with the directory provider.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config_or_default(&cli.config)?;
    let intelligence = Arc::new(DirectoryIntelligence::load(&cli.directory)?);

    match cli.command {
        Commands::Analyze { id, notes } => {
            let notes = std::fs::read_to_string(&notes)
                .with_context(|| format!("Failed to read notes: {}", notes.display()))?;
            let store = Arc::new(open_store(&cfg));
            let stored = analyze_notes(
                &store,
                intelligence.as_ref(),
                &id,
                &notes,
                SaveMode::Replace,
            )
            .await
            .map_err(RequestError::into_cli_error)?;

            println!("{}", stored.summary);
            for c in &stored.companies {
                println!("  {} [{}]", c.name, c.specialization);
            }
        }
        Commands::Serve => {
            println!("Starting server with the directory provider...");
            run_server_with_intelligence(&cfg, intelligence).await?;
        }
    }

    Ok(())
}
