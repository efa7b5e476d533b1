//! Contract for the external intelligence service.
//!
//! The research store never talks to the network. Views call an
//! [`Intelligence`] implementation, await the result, and decide whether to
//! hand a finished [`SegmentAnalysis`] to the store. Failures are typed
//! ([`IntelligenceError`]) and never reach the store.
//!
//! Model output is text that is *supposed* to be JSON. [`coerce_analysis`],
//! [`coerce_bulk`] and [`coerce_free_text`] try the expected schema and
//! otherwise hand back the raw text as [`Coerced::Freeform`], so callers
//! branch explicitly instead of relying on the shape happening to match.

use async_trait::async_trait;
use serde::Deserialize;

use crate::catalog::ComputeSegment;
use crate::models::{ContextualAnswer, FreeTextAnswer, SavedResearch, SegmentAnalysis};

/// Failure kinds of the intelligence service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntelligenceError {
    #[error("intelligence provider is disabled")]
    Disabled,

    #[error("authentication failed for {provider}")]
    Auth { provider: String },

    /// `retry_after_secs` is set only when the provider said how long to wait.
    #[error("rate limited{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("transient failure: {message}")]
    Transient { message: String },

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("response did not match the expected shape: {message}")]
    ShapeMismatch { message: String },
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!("; retry after {}s", secs),
        None => String::new(),
    }
}

impl IntelligenceError {
    /// Worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IntelligenceError::RateLimited { .. } | IntelligenceError::Transient { .. }
        )
    }

    /// Text to show the user in place of an answer.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            IntelligenceError::Disabled => {
                "Market intelligence is not configured. Set [intelligence].provider to enable it."
            }
            IntelligenceError::Auth { .. } => {
                "Could not authenticate with the intelligence service. Check the API key."
            }
            IntelligenceError::RateLimited { .. } => {
                "The intelligence service is busy. Try again in a moment."
            }
            IntelligenceError::Transient { .. } | IntelligenceError::Rejected { .. } => {
                "Error fetching intelligence from the web."
            }
            IntelligenceError::ShapeMismatch { .. } => {
                "The analysis could not be read. Nothing was saved."
            }
        }
    }
}

/// The external generative-language service.
///
/// Implementations are stateless from the caller's point of view and must be
/// `Send + Sync` so a single instance can be shared across handlers.
#[async_trait]
pub trait Intelligence: Send + Sync {
    /// Provider name for logs (e.g. `"gemini"`).
    fn name(&self) -> &str;

    /// Answer an open question, suggesting related topics.
    async fn free_text_query(&self, query: &str) -> Result<FreeTextAnswer, IntelligenceError>;

    /// Answer a question about `topic` using live web sources.
    async fn contextual_query(
        &self,
        topic: &str,
        query: &str,
    ) -> Result<ContextualAnswer, IntelligenceError>;

    /// Turn free-form research notes about one segment into an analysis.
    ///
    /// Returns [`IntelligenceError::ShapeMismatch`] when the response is not a
    /// complete analysis.
    async fn structured_extract(
        &self,
        segment_title: &str,
        raw_text: &str,
    ) -> Result<SegmentAnalysis, IntelligenceError>;

    /// Extract analyses for many segments from one market narrative.
    async fn bulk_extract(
        &self,
        narrative: &str,
        segment_ids: &[String],
    ) -> Result<SavedResearch, IntelligenceError>;

    /// Answer a question about `topic` grounded in `context` (stored research).
    async fn assistant_query(
        &self,
        topic: &str,
        context: &str,
        query: &str,
    ) -> Result<String, IntelligenceError>;
}

/// Used when no provider is configured. Every call fails with `Disabled`.
pub struct DisabledIntelligence;

#[async_trait]
impl Intelligence for DisabledIntelligence {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn free_text_query(&self, _query: &str) -> Result<FreeTextAnswer, IntelligenceError> {
        Err(IntelligenceError::Disabled)
    }

    async fn contextual_query(
        &self,
        _topic: &str,
        _query: &str,
    ) -> Result<ContextualAnswer, IntelligenceError> {
        Err(IntelligenceError::Disabled)
    }

    async fn structured_extract(
        &self,
        _segment_title: &str,
        _raw_text: &str,
    ) -> Result<SegmentAnalysis, IntelligenceError> {
        Err(IntelligenceError::Disabled)
    }

    async fn bulk_extract(
        &self,
        _narrative: &str,
        _segment_ids: &[String],
    ) -> Result<SavedResearch, IntelligenceError> {
        Err(IntelligenceError::Disabled)
    }

    async fn assistant_query(
        &self,
        _topic: &str,
        _context: &str,
        _query: &str,
    ) -> Result<String, IntelligenceError> {
        Err(IntelligenceError::Disabled)
    }
}

// ============ Response coercion ============

/// Result of reading model text against an expected schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced<T> {
    Structured(T),
    Freeform(String),
}

impl<T> Coerced<T> {
    /// Structured value, or `ShapeMismatch` carrying a preview of the text.
    pub fn into_structured(self) -> Result<T, IntelligenceError> {
        match self {
            Coerced::Structured(v) => Ok(v),
            Coerced::Freeform(text) => Err(IntelligenceError::ShapeMismatch {
                message: format!("expected JSON, got: {}", preview(&text)),
            }),
        }
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX).collect();
        format!("{}…", cut)
    }
}

/// Strip a surrounding ```json … ``` fence if present.
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn coerce<T: for<'de> Deserialize<'de>>(text: &str) -> Coerced<T> {
    match serde_json::from_str::<T>(unfence(text)) {
        Ok(v) => Coerced::Structured(v),
        Err(_) => Coerced::Freeform(text.to_string()),
    }
}

/// Read model text as a [`SegmentAnalysis`].
pub fn coerce_analysis(text: &str) -> Coerced<SegmentAnalysis> {
    coerce(text)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkItem {
    segment_id: String,
    analysis: SegmentAnalysis,
}

#[derive(Deserialize)]
struct BulkPayload {
    results: Vec<BulkItem>,
}

/// Read model text as a bulk payload `{ "results": [{ segmentId, analysis }] }`.
///
/// A segment listed twice keeps the last analysis.
pub fn coerce_bulk(text: &str) -> Coerced<SavedResearch> {
    match coerce::<BulkPayload>(text) {
        Coerced::Structured(payload) => Coerced::Structured(
            payload
                .results
                .into_iter()
                .map(|item| (item.segment_id, item.analysis))
                .collect(),
        ),
        Coerced::Freeform(text) => Coerced::Freeform(text),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FreeTextPayload {
    answer: String,
    #[serde(default)]
    related_topics: Vec<String>,
}

/// Read model text as `{ answer, relatedTopics }`. Anything else is kept as
/// the answer with no related topics.
pub fn coerce_free_text(text: &str) -> FreeTextAnswer {
    match coerce::<FreeTextPayload>(text) {
        Coerced::Structured(p) => FreeTextAnswer {
            answer_text: p.answer,
            related_topics: p.related_topics,
        },
        Coerced::Freeform(raw) => FreeTextAnswer {
            answer_text: raw.trim().to_string(),
            related_topics: Vec::new(),
        },
    }
}

/// Render a stored analysis as the context block for [`Intelligence::assistant_query`].
pub fn research_context(segment: &ComputeSegment, analysis: Option<&SegmentAnalysis>) -> String {
    let mut out = format!(
        "Segment: {} ({})\nCategory: {}\nOverview: {}\n",
        segment.title, segment.subtitle, segment.category, segment.description
    );
    match analysis {
        None => out.push_str("No research has been recorded for this segment yet.\n"),
        Some(a) => {
            if !a.summary.trim().is_empty() {
                out.push_str(&format!("Summary: {}\n", a.summary.trim()));
            }
            if !a.trends.is_empty() {
                out.push_str(&format!("Trends: {}\n", a.trends.join("; ")));
            }
            if a.companies.is_empty() {
                out.push_str("Companies: none recorded\n");
            } else {
                out.push_str("Companies:\n");
                for c in &a.companies {
                    out.push_str(&format!("- {} ({}): {}\n", c.name, c.specialization, c.description));
                }
            }
        }
    }
    out
}
