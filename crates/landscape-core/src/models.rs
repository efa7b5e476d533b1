//! Core data models shared by the store, the views, and the intelligence client.
//!
//! [`SavedResearch`] is the only persisted aggregate. It is a `BTreeMap` so the
//! serialized blob is key-ordered: writing the same state twice produces the
//! same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A company active in a compute segment.
///
/// Names are not unique; two entries with the same name are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub specialization: String,
    pub description: String,
}

impl Company {
    pub fn new(
        name: impl Into<String>,
        specialization: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            specialization: specialization.into(),
            description: description.into(),
        }
    }
}

/// The research record for exactly one segment.
///
/// Every field is required on deserialization. A blob that omits one of
/// them does not have the expected shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentAnalysis {
    pub companies: Vec<Company>,
    pub summary: String,
    pub trends: Vec<String>,
}

impl SegmentAnalysis {
    /// A recorded result with nothing in it. Distinct from "no research yet",
    /// which is the absence of an entry.
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty() && self.summary.trim().is_empty() && self.trends.is_empty()
    }
}

/// Segment id → analysis. Keys are a subset of the catalog ids.
pub type SavedResearch = BTreeMap<String, SegmentAnalysis>;

/// A web source backing a contextual answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
}

/// Answer to an open question with no segment context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeTextAnswer {
    pub answer_text: String,
    #[serde(default)]
    pub related_topics: Vec<String>,
}

/// Answer to a question asked about one topic, with its web citations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualAnswer {
    pub answer_text: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_requires_all_fields() {
        let missing_trends = r#"{"companies": [], "summary": "x"}"#;
        assert!(serde_json::from_str::<SegmentAnalysis>(missing_trends).is_err());

        let complete = r#"{"companies": [], "summary": "x", "trends": []}"#;
        let parsed: SegmentAnalysis = serde_json::from_str(complete).unwrap();
        assert_eq!(parsed.summary, "x");
    }

    #[test]
    fn test_is_empty() {
        assert!(SegmentAnalysis::default().is_empty());
        let blank_summary = SegmentAnalysis {
            summary: "   ".to_string(),
            ..Default::default()
        };
        assert!(blank_summary.is_empty());

        let with_trend = SegmentAnalysis {
            trends: vec!["2nm".to_string()],
            ..Default::default()
        };
        assert!(!with_trend.is_empty());
    }

    #[test]
    fn test_saved_research_serializes_in_key_order() {
        let mut research = SavedResearch::new();
        research.insert("si-wafer".to_string(), SegmentAnalysis::default());
        research.insert("ds-systolic".to_string(), SegmentAnalysis::default());
        let json = serde_json::to_string(&research).unwrap();
        assert!(json.find("ds-systolic").unwrap() < json.find("si-wafer").unwrap());
    }

    #[test]
    fn test_answers_use_camel_case() {
        let answer = FreeTextAnswer {
            answer_text: "a".to_string(),
            related_topics: vec!["b".to_string()],
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["answerText"], "a");
        assert_eq!(json["relatedTopics"][0], "b");
    }
}
