//! Market overview: every sector with its pooled company list.

use anyhow::Result;
use serde::Serialize;

use landscape_core::research::ResearchStore;
use landscape_core::rollup::{rollup, CategoryRollup};

use crate::config::Config;
use crate::storage_fs::open_store;

/// Overview response shared by the CLI and `GET /overview`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub sectors: Vec<CategoryRollup>,
    pub researched_segments: usize,
    pub total_segments: usize,
}

pub fn market_overview(store: &ResearchStore) -> Overview {
    let sectors = rollup(&store.get_all());
    Overview {
        researched_segments: sectors.iter().map(|s| s.researched_segments).sum(),
        total_segments: sectors.iter().map(|s| s.segment_ids.len()).sum(),
        sectors,
    }
}

pub fn run_overview(config: &Config) -> Result<()> {
    let store = open_store(config);
    let overview = market_overview(&store);

    println!(
        "Market overview ({}/{} segments researched)",
        overview.researched_segments, overview.total_segments
    );

    for sector in &overview.sectors {
        println!();
        let flag = if sector.priority { "  [priority]" } else { "" };
        println!("{}  {}{}", sector.label, sector.category, flag);
        println!("  {}", sector.description);
        println!(
            "  segments researched: {}/{}  companies: {} ({} distinct)",
            sector.researched_segments,
            sector.segment_ids.len(),
            sector.companies.len(),
            sector.distinct_companies
        );
        if sector.companies.is_empty() {
            println!("  (no companies recorded)");
            continue;
        }
        for company in sector.preview() {
            println!("    - {} [{}]", company.name, company.specialization);
        }
        if sector.hidden() > 0 {
            println!("    +{} more", sector.hidden());
        }
    }
    Ok(())
}
