//! Research notes and market narratives turned into stored analyses.
//!
//! The intelligence call is awaited to completion before the store is
//! touched. When it fails, nothing is written.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use landscape_core::catalog;
use landscape_core::intelligence::{Intelligence, IntelligenceError};
use landscape_core::models::{SavedResearch, SegmentAnalysis};
use landscape_core::research::{DedupPolicy, MergeReport, ResearchStore, StoreError};

use crate::config::Config;
use crate::gemini::create_intelligence;
use crate::research_cmd::{print_analysis, read_input};
use crate::storage_fs::{open_store, run_blocking};

/// Failure of a request that goes through the intelligence service.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("segment not found: {0}")]
    UnknownSegment(String),

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    #[error(transparent)]
    Intelligence(#[from] IntelligenceError),

    #[error("store update failed: {0:#}")]
    StoreTask(anyhow::Error),
}

impl From<StoreError> for RequestError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UnknownSegment(id) => RequestError::UnknownSegment(id),
        }
    }
}

impl RequestError {
    /// Convert for the CLI, printing the user-facing fallback text for
    /// intelligence failures.
    pub fn into_cli_error(self) -> anyhow::Error {
        if let RequestError::Intelligence(ref e) = self {
            eprintln!("{}", e.fallback_message());
        }
        anyhow::Error::new(self)
    }
}

/// How an extracted analysis reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    /// Overwrite the segment's record.
    Replace,
    /// Amend the existing record.
    Merge(DedupPolicy),
}

/// Extract an analysis for `id` from `notes` and save it.
///
/// Returns the record as stored.
pub async fn analyze_notes(
    store: &Arc<ResearchStore>,
    intelligence: &dyn Intelligence,
    id: &str,
    notes: &str,
    mode: SaveMode,
) -> Result<SegmentAnalysis, RequestError> {
    let segment = catalog::find(id).ok_or_else(|| RequestError::UnknownSegment(id.to_string()))?;
    if notes.trim().is_empty() {
        return Err(RequestError::EmptyInput("notes"));
    }

    let analysis = match intelligence.structured_extract(segment.title, notes).await {
        Ok(a) => a,
        Err(e) => {
            warn!(segment = id, provider = intelligence.name(), error = %e, "analysis failed; store unchanged");
            return Err(e.into());
        }
    };

    info!(
        segment = id,
        companies = analysis.companies.len(),
        trends = analysis.trends.len(),
        "analysis extracted"
    );

    let id = id.to_string();
    let stored = match mode {
        SaveMode::Replace => {
            run_blocking(store, move |s| s.set(&id, analysis.clone()).map(|()| analysis)).await
        }
        SaveMode::Merge(policy) => run_blocking(store, move |s| s.merge(&id, analysis, policy)).await,
    }
    .map_err(RequestError::StoreTask)??;
    Ok(stored)
}

/// Extract analyses for several segments from one narrative and merge them.
///
/// An empty `segment_ids` means every catalog segment.
pub async fn bulk_analyze(
    store: &Arc<ResearchStore>,
    intelligence: &dyn Intelligence,
    narrative: &str,
    segment_ids: &[String],
    policy: DedupPolicy,
) -> Result<MergeReport, RequestError> {
    if narrative.trim().is_empty() {
        return Err(RequestError::EmptyInput("narrative"));
    }
    if let Some(unknown) = segment_ids.iter().find(|id| !catalog::contains(id)) {
        return Err(RequestError::UnknownSegment(unknown.clone()));
    }

    let ids = if segment_ids.is_empty() {
        catalog::segment_ids()
    } else {
        segment_ids.to_vec()
    };

    let results = match intelligence.bulk_extract(narrative, &ids).await {
        Ok(r) => r,
        Err(e) => {
            warn!(provider = intelligence.name(), error = %e, "bulk analysis failed; store unchanged");
            return Err(e.into());
        }
    };

    // Only segments that were asked for.
    let (requested, extra): (Vec<_>, Vec<_>) =
        results.into_iter().partition(|(id, _)| ids.contains(id));
    let requested: SavedResearch = requested.into_iter().collect();
    let mut report = run_blocking(store, move |s| s.merge_all(requested, policy))
        .await
        .map_err(RequestError::StoreTask)?;
    report
        .skipped_unknown
        .extend(extra.into_iter().map(|(id, _)| id));

    info!(
        applied = report.applied.len(),
        skipped_unknown = report.skipped_unknown.len(),
        skipped_empty = report.skipped_empty.len(),
        "bulk analysis merged"
    );
    Ok(report)
}

// ============ CLI entry points ============

pub async fn run_analyze(
    config: &Config,
    id: &str,
    notes: &Path,
    merge: bool,
    policy: DedupPolicy,
) -> Result<()> {
    let notes = read_input(notes)?;
    let intelligence = create_intelligence(&config.intelligence)?;
    let store = Arc::new(open_store(config));

    let mode = if merge {
        SaveMode::Merge(policy)
    } else {
        SaveMode::Replace
    };

    let stored = analyze_notes(&store, intelligence.as_ref(), id, &notes, mode)
        .await
        .map_err(RequestError::into_cli_error)?;

    println!("Saved analysis for {}.", id);
    println!();
    print_analysis(&stored);
    Ok(())
}

pub async fn run_bulk(
    config: &Config,
    narrative: &Path,
    segment_ids: &[String],
    policy: DedupPolicy,
) -> Result<()> {
    let narrative = read_input(narrative)?;
    let intelligence = create_intelligence(&config.intelligence)?;
    let store = Arc::new(open_store(config));

    let report = bulk_analyze(&store, intelligence.as_ref(), &narrative, segment_ids, policy)
        .await
        .map_err(RequestError::into_cli_error)?;

    println!("bulk analysis");
    println!("  applied:         {}", report.applied.len());
    println!("  skipped empty:   {}", report.skipped_empty.len());
    println!("  skipped unknown: {}", report.skipped_unknown.len());
    for id in &report.applied {
        println!("  updated: {}", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use landscape_core::intelligence::DisabledIntelligence;
    use landscape_core::models::{Company, ContextualAnswer, FreeTextAnswer};
    use landscape_core::storage::MemoryStorage;

    /// Returns canned analyses.
    struct Canned;

    fn canned(name: &str) -> SegmentAnalysis {
        SegmentAnalysis {
            companies: vec![Company::new(name, "Wafer", "Whole-wafer engine")],
            summary: format!("{} leads", name),
            trends: vec!["Wafer-level memory".into()],
        }
    }

    #[async_trait]
    impl Intelligence for Canned {
        fn name(&self) -> &str {
            "canned"
        }
        async fn free_text_query(&self, _q: &str) -> Result<FreeTextAnswer, IntelligenceError> {
            Err(IntelligenceError::Disabled)
        }
        async fn contextual_query(
            &self,
            _t: &str,
            _q: &str,
        ) -> Result<ContextualAnswer, IntelligenceError> {
            Err(IntelligenceError::Disabled)
        }
        async fn structured_extract(
            &self,
            _title: &str,
            _text: &str,
        ) -> Result<SegmentAnalysis, IntelligenceError> {
            Ok(canned("Cerebras"))
        }
        async fn bulk_extract(
            &self,
            _narrative: &str,
            _ids: &[String],
        ) -> Result<SavedResearch, IntelligenceError> {
            let mut out = SavedResearch::new();
            out.insert("si-wafer".into(), canned("Cerebras"));
            out.insert("ep-analog".into(), canned("Mythic"));
            out.insert("made-up".into(), canned("Ghost"));
            Ok(out)
        }
        async fn assistant_query(
            &self,
            _t: &str,
            _c: &str,
            _q: &str,
        ) -> Result<String, IntelligenceError> {
            Err(IntelligenceError::Disabled)
        }
    }

    fn store() -> (Arc<MemoryStorage>, Arc<ResearchStore>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = Arc::new(ResearchStore::load(storage.clone()));
        (storage, store)
    }

    #[tokio::test]
    async fn test_analyze_replaces_record() {
        let (_, store) = store();
        let stored = analyze_notes(&store, &Canned, "si-wafer", "notes", SaveMode::Replace)
            .await
            .unwrap();
        assert_eq!(stored, canned("Cerebras"));
        assert_eq!(store.get("si-wafer").unwrap(), canned("Cerebras"));
    }

    #[tokio::test]
    async fn test_analyze_merge_by_name_does_not_duplicate() {
        let (_, store) = store();
        let mode = SaveMode::Merge(DedupPolicy::ByName);
        analyze_notes(&store, &Canned, "si-wafer", "notes", mode).await.unwrap();
        let stored = analyze_notes(&store, &Canned, "si-wafer", "notes", mode).await.unwrap();
        let cerebras = stored
            .companies
            .iter()
            .filter(|c| c.name.eq_ignore_ascii_case("cerebras"))
            .count();
        assert_eq!(cerebras, 1);
    }

    #[tokio::test]
    async fn test_failed_analysis_leaves_store_untouched() {
        let (storage, store) = store();
        let before = storage.snapshot(store.key());
        let err = analyze_notes(&store, &DisabledIntelligence, "si-wafer", "notes", SaveMode::Replace)
            .await
            .unwrap_err();
        assert!(matches!(err, RequestError::Intelligence(IntelligenceError::Disabled)));
        assert_eq!(storage.snapshot(store.key()), before);
    }

    #[tokio::test]
    async fn test_analyze_validates_input() {
        let (_, store) = store();
        assert!(matches!(
            analyze_notes(&store, &Canned, "nope", "notes", SaveMode::Replace).await,
            Err(RequestError::UnknownSegment(_))
        ));
        assert!(matches!(
            analyze_notes(&store, &Canned, "si-wafer", "   ", SaveMode::Replace).await,
            Err(RequestError::EmptyInput("notes"))
        ));
    }

    #[tokio::test]
    async fn test_bulk_only_applies_requested_segments() {
        let (_, store) = store();
        let ids = vec!["si-wafer".to_string()];
        let report = bulk_analyze(&store, &Canned, "narrative", &ids, DedupPolicy::ByName)
            .await
            .unwrap();
        assert_eq!(report.applied, vec!["si-wafer".to_string()]);
        assert!(report.skipped_unknown.contains(&"ep-analog".to_string()));
        assert!(report.skipped_unknown.contains(&"made-up".to_string()));
    }

    #[tokio::test]
    async fn test_bulk_rejects_unknown_request() {
        let (_, store) = store();
        let ids = vec!["made-up".to_string()];
        assert!(matches!(
            bulk_analyze(&store, &Canned, "narrative", &ids, DedupPolicy::KeepAll).await,
            Err(RequestError::UnknownSegment(_))
        ));
    }
}
