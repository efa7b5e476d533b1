//! The research store: segment id → analysis, with write-through persistence.
//!
//! [`ResearchStore`] is the single source of truth for per-segment research.
//! It is created once by the application root and shared by handle
//! (`Arc<ResearchStore>`) with every view that needs it.
//!
//! # Persistence
//!
//! The whole [`SavedResearch`] map is serialized to one JSON blob and written
//! synchronously after every mutation. There is no batching. A failed write
//! is logged and the in-memory state is kept, so a storage fault never
//! blocks the caller.
//!
//! # Loading
//!
//! | Persisted blob | Result |
//! |----------------|--------|
//! | valid | adopted; keys that are not catalog ids are dropped |
//! | corrupt or wrong shape | copied to the first free `<key>.corrupt[.N]`, defaults adopted and written |
//! | absent | defaults adopted and written |
//! | medium unavailable | defaults adopted, write attempted |
//!
//! Loading never fails.
//!
//! # Merging
//!
//! [`ResearchStore::set`] replaces a record wholesale. Amending an existing
//! record goes through [`ResearchStore::merge`], which takes an explicit
//! [`DedupPolicy`] deciding what happens to companies that are already listed.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::defaults::default_research;
use crate::models::{Company, SavedResearch, SegmentAnalysis};
use crate::storage::{Storage, STORAGE_KEY};

// Past this many, the last backup slot is reused.
const MAX_BACKUPS: usize = 99;

/// Errors returned by store mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown segment: {0}")]
    UnknownSegment(String),
}

/// How [`ResearchStore::merge`] treats companies and trends already present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Append everything. Repeated mentions produce repeated entries.
    #[default]
    KeepAll,
    /// One entry per company name (trimmed, case-insensitive). A later entry
    /// replaces the earlier one in place. Trends already present are skipped.
    ByName,
}

impl DedupPolicy {
    /// Collapse duplicates inside a single analysis. Identity for `KeepAll`.
    pub fn dedupe(self, analysis: SegmentAnalysis) -> SegmentAnalysis {
        match self {
            DedupPolicy::KeepAll => analysis,
            DedupPolicy::ByName => {
                let mut out = SegmentAnalysis {
                    companies: Vec::with_capacity(analysis.companies.len()),
                    summary: analysis.summary,
                    trends: Vec::with_capacity(analysis.trends.len()),
                };
                for company in analysis.companies {
                    upsert_company(&mut out.companies, company);
                }
                for trend in analysis.trends {
                    push_trend(&mut out.trends, trend);
                }
                out
            }
        }
    }

    /// Fold `incoming` into `existing`.
    ///
    /// A non-blank incoming summary replaces the existing one. Companies and
    /// trends are appended according to the policy.
    pub fn merge(self, existing: Option<SegmentAnalysis>, incoming: SegmentAnalysis) -> SegmentAnalysis {
        let mut out = self.dedupe(existing.unwrap_or_default());
        if !incoming.summary.trim().is_empty() {
            out.summary = incoming.summary;
        }
        match self {
            DedupPolicy::KeepAll => {
                out.companies.extend(incoming.companies);
                out.trends.extend(incoming.trends);
            }
            DedupPolicy::ByName => {
                for company in incoming.companies {
                    upsert_company(&mut out.companies, company);
                }
                for trend in incoming.trends {
                    push_trend(&mut out.trends, trend);
                }
            }
        }
        out
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DedupPolicy::KeepAll => f.write_str("keep-all"),
            DedupPolicy::ByName => f.write_str("by-name"),
        }
    }
}

impl FromStr for DedupPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep-all" | "keepall" | "none" => Ok(DedupPolicy::KeepAll),
            "by-name" | "byname" | "name" => Ok(DedupPolicy::ByName),
            other => anyhow::bail!("unknown dedup policy '{}'. Must be keep-all or by-name.", other),
        }
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn upsert_company(companies: &mut Vec<Company>, company: Company) {
    let key = name_key(&company.name);
    match companies.iter_mut().find(|c| name_key(&c.name) == key) {
        Some(slot) => *slot = company,
        None => companies.push(company),
    }
}

fn push_trend(trends: &mut Vec<String>, trend: String) {
    let key = trend.trim().to_lowercase();
    if !trends.iter().any(|t| t.trim().to_lowercase() == key) {
        trends.push(trend);
    }
}

/// Outcome of a bulk merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    /// Segment ids whose records were created or amended.
    pub applied: Vec<String>,
    /// Ids that are not in the catalog.
    pub skipped_unknown: Vec<String>,
    /// Known ids whose incoming analysis carried no data.
    pub skipped_empty: Vec<String>,
}

/// Parse a persisted blob, dropping keys that are not catalog ids.
fn parse_saved(raw: &str) -> serde_json::Result<SavedResearch> {
    let mut research: SavedResearch = serde_json::from_str(raw)?;
    research.retain(|id, _| {
        let known = catalog::contains(id);
        if !known {
            warn!(segment = id.as_str(), "dropping saved research for unknown segment");
        }
        known
    });
    Ok(research)
}

/// First of `<key>.corrupt`, `<key>.corrupt.1`, ... not already holding a blob.
fn backup_key(storage: &dyn Storage, key: &str) -> String {
    let base = format!("{}.corrupt", key);
    let mut candidate = base.clone();
    for n in 1..=MAX_BACKUPS {
        match storage.read(&candidate) {
            Ok(Some(_)) => candidate = format!("{}.{}", base, n),
            _ => return candidate,
        }
    }
    candidate
}

/// Serialize and write the whole map. Failures are logged, never returned.
fn persist(storage: &dyn Storage, key: &str, research: &SavedResearch) {
    let blob = match serde_json::to_string(research) {
        Ok(b) => b,
        Err(e) => {
            warn!(key, error = %e, "failed to serialize saved research");
            return;
        }
    };
    match storage.write(key, &blob) {
        Ok(()) => {
            debug!(key, segments = research.len(), bytes = blob.len(), "saved research persisted");
        }
        Err(e) => {
            warn!(key, error = %e, "failed to persist saved research; keeping in-memory state");
        }
    }
}

/// Owner of the saved research map and its persistence.
pub struct ResearchStore {
    storage: Arc<dyn Storage>,
    key: String,
    state: RwLock<SavedResearch>,
}

impl ResearchStore {
    /// Load from `storage` under [`STORAGE_KEY`].
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        Self::load_with_key(storage, STORAGE_KEY)
    }

    /// Load from `storage` under a custom blob key.
    pub fn load_with_key(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        let key = key.into();

        let state = match storage.read(&key) {
            Ok(Some(raw)) => match parse_saved(&raw) {
                Ok(research) => {
                    debug!(key = key.as_str(), segments = research.len(), "loaded saved research");
                    research
                }
                Err(e) => {
                    warn!(key = key.as_str(), error = %e, "saved research is corrupt; restoring defaults");
                    let backup = backup_key(storage.as_ref(), &key);
                    if let Err(e) = storage.write(&backup, &raw) {
                        warn!(key = backup.as_str(), error = %e, "could not keep a copy of the corrupt blob");
                    }
                    let research = default_research();
                    persist(storage.as_ref(), &key, &research);
                    research
                }
            },
            Ok(None) => {
                info!(key = key.as_str(), "no saved research found; seeding defaults");
                let research = default_research();
                persist(storage.as_ref(), &key, &research);
                research
            }
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "storage unavailable; continuing with defaults");
                let research = default_research();
                persist(storage.as_ref(), &key, &research);
                research
            }
        };

        Self {
            storage,
            key,
            state: RwLock::new(state),
        }
    }

    /// The blob key this store persists under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current record for `id`, or `None` when the segment has no research yet.
    pub fn get(&self, id: &str) -> Option<SegmentAnalysis> {
        self.read_state().get(id).cloned()
    }

    /// The whole current map.
    pub fn get_all(&self) -> SavedResearch {
        self.read_state().clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.read_state().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.read_state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_state().is_empty()
    }

    /// Insert or fully replace the record for `id`.
    ///
    /// No deduplication or content validation is applied. Other segments are
    /// untouched. The new state is written before this returns.
    pub fn set(&self, id: &str, analysis: SegmentAnalysis) -> Result<(), StoreError> {
        ensure_known(id)?;
        let mut state = self.write_state();
        state.insert(id.to_string(), analysis);
        persist(self.storage.as_ref(), &self.key, &state);
        Ok(())
    }

    /// Amend the record for `id` with `incoming` under `policy`.
    ///
    /// Creates the record when absent. Returns the stored result.
    pub fn merge(
        &self,
        id: &str,
        incoming: SegmentAnalysis,
        policy: DedupPolicy,
    ) -> Result<SegmentAnalysis, StoreError> {
        ensure_known(id)?;
        let mut state = self.write_state();
        let merged = policy.merge(state.get(id).cloned(), incoming);
        state.insert(id.to_string(), merged.clone());
        persist(self.storage.as_ref(), &self.key, &state);
        Ok(merged)
    }

    /// Merge many segment results with a single write.
    ///
    /// Unknown ids and empty analyses are skipped and reported.
    pub fn merge_all(&self, results: SavedResearch, policy: DedupPolicy) -> MergeReport {
        self.merge_many(results, policy, false)
    }

    /// Merge previously saved records with a single write.
    ///
    /// Unlike [`merge_all`](Self::merge_all), an empty analysis is a recorded
    /// result: it creates the record when absent and leaves an existing one
    /// as it is.
    pub fn restore_all(&self, records: SavedResearch, policy: DedupPolicy) -> MergeReport {
        self.merge_many(records, policy, true)
    }

    fn merge_many(&self, results: SavedResearch, policy: DedupPolicy, keep_empty: bool) -> MergeReport {
        let mut report = MergeReport::default();
        let mut state = self.write_state();

        for (id, incoming) in results {
            if !catalog::contains(&id) {
                warn!(segment = id.as_str(), "skipping result for unknown segment");
                report.skipped_unknown.push(id);
                continue;
            }
            if incoming.is_empty() && !keep_empty {
                report.skipped_empty.push(id);
                continue;
            }
            let merged = policy.merge(state.get(&id).cloned(), incoming);
            state.insert(id.clone(), merged);
            report.applied.push(id);
        }

        if !report.applied.is_empty() {
            persist(self.storage.as_ref(), &self.key, &state);
        }
        report
    }

    /// Remove the record for `id`. Returns whether one existed.
    ///
    /// Afterwards the segment reads as absent, not as an empty record.
    pub fn clear(&self, id: &str) -> bool {
        let mut state = self.write_state();
        let removed = state.remove(id).is_some();
        persist(self.storage.as_ref(), &self.key, &state);
        removed
    }

    /// Replace everything with the bundled defaults.
    pub fn reset(&self) {
        let mut state = self.write_state();
        *state = default_research();
        persist(self.storage.as_ref(), &self.key, &state);
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SavedResearch> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    // Held across mutate + persist so read-modify-write is atomic.
    fn write_state(&self) -> RwLockWriteGuard<'_, SavedResearch> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn ensure_known(id: &str) -> Result<(), StoreError> {
    if catalog::contains(id) {
        Ok(())
    } else {
        Err(StoreError::UnknownSegment(id.to_string()))
    }
}
