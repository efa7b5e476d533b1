//! Catalog browsing and direct edits of saved research.
//!
//! Each operation has a core function returning structured data (shared with
//! the HTTP server) and a `run_*` CLI entry point that prints to stdout.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use landscape_core::catalog::{self, Category, ComputeSegment};
use landscape_core::models::{SavedResearch, SegmentAnalysis};
use landscape_core::research::{DedupPolicy, MergeReport, ResearchStore};

use crate::config::Config;
use crate::storage_fs::open_store;

/// A catalog entry and whether research exists for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentListing {
    #[serde(flatten)]
    pub segment: &'static ComputeSegment,
    pub has_research: bool,
}

/// A segment with its stored analysis, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentDetail {
    pub segment: &'static ComputeSegment,
    pub analysis: Option<SegmentAnalysis>,
}

/// Saved research as written by `export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    /// RFC 3339 timestamp.
    pub exported_at: String,
    pub research: SavedResearch,
}

/// Catalog entries in display order, optionally limited to one category.
pub fn list_segments(store: &ResearchStore, category: Option<Category>) -> Vec<SegmentListing> {
    catalog::segments()
        .iter()
        .filter(|s| category.map_or(true, |c| s.category == c))
        .map(|segment| SegmentListing {
            segment,
            has_research: store.contains(segment.id),
        })
        .collect()
}

/// Look up a segment and its research.
pub fn segment_detail(store: &ResearchStore, id: &str) -> Result<SegmentDetail> {
    let segment = find_segment(id)?;
    Ok(SegmentDetail {
        segment,
        analysis: store.get(id),
    })
}

pub(crate) fn find_segment(id: &str) -> Result<&'static ComputeSegment> {
    match catalog::find(id) {
        Some(s) => Ok(s),
        None => bail!("segment not found: {}", id),
    }
}

/// Snapshot the store for export.
pub fn export_research(store: &ResearchStore) -> ExportEnvelope {
    ExportEnvelope {
        exported_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        research: store.get_all(),
    }
}

/// Parse an import file: either an [`ExportEnvelope`] or a bare map.
pub fn parse_import(raw: &str) -> Result<SavedResearch> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("Import file is not valid JSON")?;

    let research = if value.get("research").is_some() && value.get("exportedAt").is_some() {
        serde_json::from_value::<ExportEnvelope>(value)
            .context("Invalid export envelope")?
            .research
    } else {
        serde_json::from_value::<SavedResearch>(value)
            .context("Import must map segment ids to complete analyses")?
    };
    Ok(research)
}

/// Apply imported research. With `replace`, each record overwrites the
/// stored one; otherwise it is merged under `policy`. Imported empty
/// analyses are kept as recorded results either way.
pub fn import_research(
    store: &ResearchStore,
    research: SavedResearch,
    policy: DedupPolicy,
    replace: bool,
) -> MergeReport {
    if !replace {
        return store.restore_all(research, policy);
    }

    let mut report = MergeReport::default();
    for (id, analysis) in research {
        match store.set(&id, analysis) {
            Ok(()) => report.applied.push(id),
            Err(_) => report.skipped_unknown.push(id),
        }
    }
    report
}

/// Read a file, or stdin when `path` is `-`.
pub(crate) fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

// ============ CLI entry points ============

pub fn run_segments(config: &Config, category: Option<&str>) -> Result<()> {
    let category = category.map(|c| c.parse::<Category>()).transpose()?;
    let store = open_store(config);
    let listings = list_segments(&store, category);

    let mut current: Option<Category> = None;
    for listing in &listings {
        let seg = listing.segment;
        if current != Some(seg.category) {
            if current.is_some() {
                println!();
            }
            println!("{}", seg.category);
            current = Some(seg.category);
        }
        let mark = if listing.has_research { "*" } else { " " };
        println!(
            "  {} {:<18} {:<20} {}",
            mark, seg.id, seg.title, seg.subtitle
        );
    }

    let researched = listings.iter().filter(|l| l.has_research).count();
    println!();
    println!("{} segments, {} with research (*)", listings.len(), researched);
    Ok(())
}

pub fn run_show(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config);
    let detail = segment_detail(&store, id)?;
    let seg = detail.segment;

    println!("--- Segment ---");
    println!("id:          {}", seg.id);
    println!("title:       {} ({})", seg.title, seg.subtitle);
    println!("category:    {}", seg.category);
    println!("tag:         {}", seg.side_tag);
    println!("model:       {}", seg.model);
    println!("math:        {}", seg.math);
    println!("scale:       {}", seg.scale);
    println!();
    println!("{}", seg.description);
    println!();

    match detail.analysis {
        None => println!("No research yet for this segment."),
        Some(analysis) => print_analysis(&analysis),
    }
    Ok(())
}

pub(crate) fn print_analysis(analysis: &SegmentAnalysis) {
    println!("--- Summary ---");
    println!("{}", analysis.summary);
    println!();

    println!("--- Trends ({}) ---", analysis.trends.len());
    for trend in &analysis.trends {
        println!("  - {}", trend);
    }
    println!();

    println!("--- Companies ({}) ---", analysis.companies.len());
    for company in &analysis.companies {
        println!("  {} [{}]", company.name, company.specialization);
        println!("    {}", company.description);
    }
}

pub fn run_set(config: &Config, id: &str, file: &Path) -> Result<()> {
    find_segment(id)?;
    let raw = read_input(file)?;
    let analysis: SegmentAnalysis =
        serde_json::from_str(&raw).context("Analysis must have companies, summary and trends")?;

    let store = open_store(config);
    store.set(id, analysis)?;
    println!("Saved research for {}.", id);
    Ok(())
}

pub fn run_clear(config: &Config, id: &str) -> Result<()> {
    find_segment(id)?;
    let store = open_store(config);
    if store.clear(id) {
        println!("Cleared research for {}.", id);
    } else {
        println!("No research stored for {}.", id);
    }
    Ok(())
}

pub fn run_reset(config: &Config) -> Result<()> {
    let store = open_store(config);
    store.reset();
    println!("Restored default research for {} segments.", store.len());
    Ok(())
}

pub fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = open_store(config);
    let envelope = export_research(&store);
    let json = serde_json::to_string_pretty(&envelope)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Exported {} segments to {}",
                envelope.research.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub fn run_import(config: &Config, file: &Path, policy: DedupPolicy, replace: bool) -> Result<()> {
    let research = parse_import(&read_input(file)?)?;
    let store = open_store(config);
    let report = import_research(&store, research, policy, replace);

    println!("import {}", if replace { "(replace)" } else { "(merge)" });
    println!("  applied:         {}", report.applied.len());
    println!("  skipped unknown: {}", report.skipped_unknown.len());
    println!("  skipped empty:   {}", report.skipped_empty.len());
    for id in &report.skipped_unknown {
        println!("  unknown segment: {}", id);
    }
    Ok(())
}
