//! Category rollups for the market overview.
//!
//! Flattens the research of every segment in a category into one company
//! list. Duplicates across segments are kept; `distinct_companies` counts
//! unique names.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::{self, Category};
use crate::models::{Company, SavedResearch};

/// Number of companies the overview lists per sector before "+N more".
pub const PREVIEW_LIMIT: usize = 5;

/// One sector of the market overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRollup {
    pub category: Category,
    /// "Segment 01" … "Segment 05", by overview position.
    pub label: String,
    pub description: &'static str,
    pub priority: bool,
    pub segment_ids: Vec<&'static str>,
    pub researched_segments: usize,
    pub companies: Vec<Company>,
    pub distinct_companies: usize,
}

impl CategoryRollup {
    /// The companies shown before truncation.
    pub fn preview(&self) -> &[Company] {
        let n = self.companies.len().min(PREVIEW_LIMIT);
        &self.companies[..n]
    }

    /// How many companies the preview leaves out.
    pub fn hidden(&self) -> usize {
        self.companies.len().saturating_sub(PREVIEW_LIMIT)
    }
}

/// All companies recorded for segments of `category`, in catalog order.
pub fn category_companies(research: &SavedResearch, category: Category) -> Vec<Company> {
    catalog::by_category(category)
        .into_iter()
        .filter_map(|seg| research.get(seg.id))
        .flat_map(|analysis| analysis.companies.iter().cloned())
        .collect()
}

/// Every sector, in overview order.
pub fn rollup(research: &SavedResearch) -> Vec<CategoryRollup> {
    Category::OVERVIEW_ORDER
        .iter()
        .enumerate()
        .map(|(i, &category)| {
            let segment_ids: Vec<&'static str> =
                catalog::by_category(category).iter().map(|s| s.id).collect();
            let researched_segments = segment_ids
                .iter()
                .filter(|id| research.contains_key(**id))
                .count();
            let companies = category_companies(research, category);
            let distinct_companies = companies
                .iter()
                .map(|c| c.name.trim().to_lowercase())
                .collect::<BTreeSet<_>>()
                .len();

            CategoryRollup {
                category,
                label: format!("Segment {:02}", i + 1),
                description: category.description(),
                priority: category.is_priority(),
                segment_ids,
                researched_segments,
                companies,
                distinct_companies,
            }
        })
        .collect()
}
