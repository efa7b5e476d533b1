//! Questions answered by the intelligence service.
//!
//! - `ask`: web-grounded answer about one segment, with citations.
//! - `search`: open question with suggested related topics.
//! - `chat`: answer drawn from the segment's stored research.
//!
//! None of these write to the research store.

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use landscape_core::catalog;
use landscape_core::intelligence::{research_context, Intelligence};
use landscape_core::models::{ContextualAnswer, FreeTextAnswer};
use landscape_core::research::ResearchStore;
use landscape_core::sequence::LatestResponse;

use crate::analyze::RequestError;
use crate::config::Config;
use crate::gemini::create_intelligence;
use crate::storage_fs::open_store;

/// A contextual answer tagged with its request sequence number.
#[derive(Debug, Clone, Serialize)]
pub struct SequencedAnswer {
    pub sequence: u64,
    /// `false` when a newer question was issued before this one finished.
    pub applied: bool,
    pub answer: ContextualAnswer,
}

fn non_empty(query: &str) -> Result<&str, RequestError> {
    let query = query.trim();
    if query.is_empty() {
        Err(RequestError::EmptyInput("query"))
    } else {
        Ok(query)
    }
}

/// Web-grounded question about segment `id`.
pub async fn ask_segment(
    intelligence: &dyn Intelligence,
    id: &str,
    query: &str,
) -> Result<ContextualAnswer, RequestError> {
    let segment = catalog::find(id).ok_or_else(|| RequestError::UnknownSegment(id.to_string()))?;
    let query = non_empty(query)?;
    Ok(intelligence.contextual_query(segment.title, query).await?)
}

/// [`ask_segment`], offering the answer to `latest`. Only the most recently
/// issued question's answer is kept there.
pub async fn ask_segment_latest(
    latest: &LatestResponse<ContextualAnswer>,
    intelligence: &dyn Intelligence,
    id: &str,
    query: &str,
) -> Result<SequencedAnswer, RequestError> {
    let segment = catalog::find(id).ok_or_else(|| RequestError::UnknownSegment(id.to_string()))?;
    let query = non_empty(query)?;

    let ticket = latest.begin();
    let sequence = ticket.number();
    let answer = intelligence.contextual_query(segment.title, query).await?;
    let applied = latest.complete(ticket, answer.clone());
    if !applied {
        debug!(segment = id, sequence, "newer question pending; answer not applied");
    }
    Ok(SequencedAnswer {
        sequence,
        applied,
        answer,
    })
}

/// Open market question.
pub async fn search(
    intelligence: &dyn Intelligence,
    query: &str,
) -> Result<FreeTextAnswer, RequestError> {
    let query = non_empty(query)?;
    Ok(intelligence.free_text_query(query).await?)
}

/// Question about segment `id`, answered from its stored research.
pub async fn chat(
    store: &ResearchStore,
    intelligence: &dyn Intelligence,
    id: &str,
    query: &str,
) -> Result<String, RequestError> {
    let segment = catalog::find(id).ok_or_else(|| RequestError::UnknownSegment(id.to_string()))?;
    let query = non_empty(query)?;
    let analysis = store.get(id);
    let context = research_context(segment, analysis.as_ref());
    Ok(intelligence
        .assistant_query(segment.title, &context, query)
        .await?)
}

// ============ CLI entry points ============

pub async fn run_ask(config: &Config, id: &str, query: &str) -> Result<()> {
    let intelligence = create_intelligence(&config.intelligence)?;
    let answer = ask_segment(intelligence.as_ref(), id, query)
        .await
        .map_err(RequestError::into_cli_error)?;

    println!("{}", answer.answer_text);
    if !answer.citations.is_empty() {
        println!();
        println!("--- Sources ({}) ---", answer.citations.len());
        for (i, c) in answer.citations.iter().enumerate() {
            println!("{}. {}", i + 1, c.title);
            println!("   {}", c.url);
        }
    }
    Ok(())
}

pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    let intelligence = create_intelligence(&config.intelligence)?;
    let answer = search(intelligence.as_ref(), query)
        .await
        .map_err(RequestError::into_cli_error)?;

    println!("{}", answer.answer_text);
    if !answer.related_topics.is_empty() {
        println!();
        println!("Related topics:");
        for topic in &answer.related_topics {
            println!("  - {}", topic);
        }
    }
    Ok(())
}

pub async fn run_chat(config: &Config, id: &str, query: &str) -> Result<()> {
    let intelligence = create_intelligence(&config.intelligence)?;
    let store = open_store(config);
    let reply = chat(&store, intelligence.as_ref(), id, query)
        .await
        .map_err(RequestError::into_cli_error)?;
    println!("{}", reply);
    Ok(())
}
