//! Prompt text and response schemas sent to the generative-language API.

use serde_json::{json, Value};

const ANALYST_PERSONA: &str = "You are a senior semiconductor market analyst at a venture capital firm.";

const EXPERT_PERSONA: &str =
    "You are a semiconductor industry expert helping an investor understand the market.";

/// Extract one segment's analysis from research notes.
pub fn extract_prompt(segment_title: &str, raw_text: &str) -> String {
    format!(
        "{persona}\n\
         Read the research notes below about the '{title}' chip architecture segment and report:\n\
         1. The companies working on this architecture (integrated designers, foundries, EDA and IP vendors, OSATs).\n\
         2. Each company's technical specialization within the segment.\n\
         3. A short strategic summary of market readiness and the current bottlenecks.\n\
         4. The macro trends shaping the segment.\n\
         Use only what the notes support.\n\n\
         Research notes:\n{notes}",
        persona = ANALYST_PERSONA,
        title = segment_title,
        notes = raw_text
    )
}

/// Extract analyses for several segments from one narrative.
pub fn bulk_prompt(narrative: &str, segment_ids: &[String]) -> String {
    format!(
        "{persona}\n\
         You are running a broad market scan. From the narrative below, extract data for each of these \
         segment ids: [{ids}].\n\
         For every segment list the relevant companies, summarize their approach as described in the \
         narrative, and note key trends. Return empty data for a segment the narrative does not mention. \
         Use the segment ids exactly as given.\n\n\
         Narrative:\n{narrative}",
        persona = ANALYST_PERSONA,
        ids = segment_ids.join(", "),
        narrative = narrative
    )
}

/// Web-grounded question about one segment.
pub fn contextual_prompt(topic: &str, query: &str) -> String {
    format!(
        "{persona} The topic is the '{topic}' market segment.\n\
         Answer in clear, plain English and be thorough. Explain technical terms when you use them. \
         Prefer current data from the web.\n\n\
         Question: {query}",
        persona = EXPERT_PERSONA,
        topic = topic,
        query = query
    )
}

/// Open question with no segment context.
pub fn free_text_prompt(query: &str) -> String {
    format!(
        "{persona}\n\
         Answer the question below in clear, plain English. Also suggest a few short related topics \
         the reader could explore next.\n\n\
         Question: {query}",
        persona = EXPERT_PERSONA,
        query = query
    )
}

/// Question answered from stored research.
pub fn assistant_prompt(topic: &str, context: &str, query: &str) -> String {
    format!(
        "{persona} The topic is the '{topic}' market segment.\n\
         Base your answer on the research data below, structure it logically, and explain technical \
         terms when you use them.\n\n\
         Research data:\n{context}\n\
         Question: {query}",
        persona = EXPERT_PERSONA,
        topic = topic,
        context = context,
        query = query
    )
}

fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "companies": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "specialization": { "type": "STRING" },
                        "description": { "type": "STRING" }
                    },
                    "required": ["name", "specialization", "description"]
                }
            },
            "summary": { "type": "STRING" },
            "trends": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["companies", "summary", "trends"]
    })
}

/// Schema for [`extract_prompt`] responses.
pub fn extract_schema() -> Value {
    analysis_schema()
}

/// Schema for [`bulk_prompt`] responses.
pub fn bulk_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "results": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "segmentId": { "type": "STRING" },
                        "analysis": analysis_schema()
                    },
                    "required": ["segmentId", "analysis"]
                }
            }
        },
        "required": ["results"]
    })
}

/// Schema for [`free_text_prompt`] responses.
pub fn free_text_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "answer": { "type": "STRING" },
            "relatedTopics": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": ["answer"]
    })
}
