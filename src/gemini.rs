//! Gemini implementation of the [`Intelligence`] contract.
//!
//! Calls `POST {base_url}/models/{model}:generateContent` on the Generative
//! Language API. The API key is read from the environment variable named by
//! `[intelligence].api_key_env` and sent in the `x-goog-api-key` header.
//!
//! # Provider Selection
//!
//! Use [`create_intelligence`] to build the configured provider:
//!
//! ```rust,no_run
//! # use compute_landscape::config::IntelligenceConfig;
//! # use compute_landscape::gemini::create_intelligence;
//! let config = IntelligenceConfig::default(); // provider = "disabled"
//! let intelligence = create_intelligence(&config).unwrap();
//! assert_eq!(intelligence.name(), "disabled");
//! ```
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 401/403 → fail immediately with `Auth`
//! - Other 4xx → fail immediately with `Rejected`
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5), or the 429's
//!   `Retry-After` seconds when given (same cap)

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use landscape_core::intelligence::{
    coerce_analysis, coerce_bulk, coerce_free_text, DisabledIntelligence, Intelligence,
    IntelligenceError,
};
use landscape_core::models::{
    Citation, ContextualAnswer, FreeTextAnswer, SavedResearch, SegmentAnalysis,
};

use crate::config::IntelligenceConfig;
use crate::prompts;

const MAX_BACKOFF_SECS: u64 = 32;

/// The public Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const NO_INTELLIGENCE: &str = "No intelligence found for this query.";
const NO_RESPONSE: &str = "No response generated.";

/// Text and grounding sources pulled from a `generateContent` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    bulk_model: String,
    max_retries: u32,
}

impl GeminiClient {
    /// Create a client from configuration, reading the key from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable named by `api_key_env` is unset.
    pub fn new(config: &IntelligenceConfig) -> Result<Self> {
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(k) if !k.trim().is_empty() => k,
            _ => bail!("{} environment variable not set", config.api_key_env),
        };
        Self::new_with_key(config, api_key)
    }

    /// Create a client with an explicitly provided key.
    pub fn new_with_key(config: &IntelligenceConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            bulk_model: config.bulk_model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    /// Send one `generateContent` request with retry/backoff and parse it.
    async fn generate(&self, model: &str, body: &Value) -> Result<Generated, IntelligenceError> {
        let url = self.endpoint_url(model);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let backoff = 1u64 << (attempt - 1).min(5);
                let secs = match &last_err {
                    Some(IntelligenceError::RateLimited {
                        retry_after_secs: Some(secs),
                    }) => (*secs).min(MAX_BACKOFF_SECS),
                    _ => backoff,
                };
                tokio::time::sleep(Duration::from_secs(secs)).await;
            }

            debug!(model, attempt, "sending Gemini request");

            let resp = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(response.headers());
                    let body_text = response.text().await.unwrap_or_default();

                    if status.is_success() {
                        let json: Value = serde_json::from_str(&body_text).map_err(|e| {
                            IntelligenceError::ShapeMismatch {
                                message: format!("invalid JSON from Gemini: {}", e),
                            }
                        })?;
                        return parse_generated(&json);
                    }

                    let err = map_status(status.as_u16(), retry_after, &body_text);
                    if err.is_retryable() {
                        warn!(model, attempt, error = %err, "Gemini request failed; will retry");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    warn!(model, attempt, error = %e, "Gemini request failed; will retry");
                    last_err = Some(IntelligenceError::Transient {
                        message: e.to_string(),
                    });
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| IntelligenceError::Transient {
            message: "Gemini request failed after retries".to_string(),
        }))
    }
}

fn user_contents(prompt: &str) -> Value {
    json!([{ "role": "user", "parts": [{ "text": prompt }] }])
}

/// Body asking for JSON matching `schema`.
pub fn structured_body(prompt: &str, schema: Value) -> Value {
    json!({
        "contents": user_contents(prompt),
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": schema,
        }
    })
}

/// Body with Google Search grounding enabled.
pub fn grounded_body(prompt: &str) -> Value {
    json!({
        "contents": user_contents(prompt),
        "tools": [{ "googleSearch": {} }],
    })
}

/// Plain text body.
pub fn plain_body(prompt: &str) -> Value {
    json!({ "contents": user_contents(prompt) })
}

/// Delay-seconds form of `Retry-After`. The HTTP-date form is ignored.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Map a non-success HTTP status to an [`IntelligenceError`].
pub fn map_status(status: u16, retry_after: Option<u64>, body_text: &str) -> IntelligenceError {
    match status {
        401 | 403 => IntelligenceError::Auth {
            provider: "Gemini".to_string(),
        },
        429 => IntelligenceError::RateLimited {
            retry_after_secs: retry_after,
        },
        500..=599 => IntelligenceError::Transient {
            message: format!("HTTP {} from Gemini API: {}", status, body_text),
        },
        _ => IntelligenceError::Rejected {
            status,
            message: body_text.to_string(),
        },
    }
}

/// Extract the first candidate's text and grounding citations.
pub fn parse_generated(body: &Value) -> Result<Generated, IntelligenceError> {
    let candidates = body["candidates"].as_array().ok_or_else(|| {
        let reason = body["promptFeedback"]["blockReason"]
            .as_str()
            .map(|r| format!(" (blocked: {})", r))
            .unwrap_or_default();
        IntelligenceError::ShapeMismatch {
            message: format!("missing 'candidates' array in response{}", reason),
        }
    })?;

    let candidate = candidates
        .first()
        .ok_or_else(|| IntelligenceError::ShapeMismatch {
            message: "empty 'candidates' array in response".to_string(),
        })?;

    let text = candidate["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let citations = candidate["groundingMetadata"]["groundingChunks"]
        .as_array()
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let web = &chunk["web"];
                    let url = web["uri"].as_str()?;
                    let title = web["title"].as_str().unwrap_or(url);
                    Some(Citation {
                        url: url.to_string(),
                        title: title.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Generated { text, citations })
}

fn or_fallback(text: String, fallback: &str) -> String {
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

#[async_trait]
impl Intelligence for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn free_text_query(&self, query: &str) -> Result<FreeTextAnswer, IntelligenceError> {
        let body = structured_body(&prompts::free_text_prompt(query), prompts::free_text_schema());
        let generated = self.generate(&self.model, &body).await?;
        let mut answer = coerce_free_text(&generated.text);
        answer.answer_text = or_fallback(answer.answer_text, NO_INTELLIGENCE);
        Ok(answer)
    }

    async fn contextual_query(
        &self,
        topic: &str,
        query: &str,
    ) -> Result<ContextualAnswer, IntelligenceError> {
        let body = grounded_body(&prompts::contextual_prompt(topic, query));
        let generated = self.generate(&self.model, &body).await?;
        Ok(ContextualAnswer {
            answer_text: or_fallback(generated.text, NO_INTELLIGENCE),
            citations: generated.citations,
        })
    }

    async fn structured_extract(
        &self,
        segment_title: &str,
        raw_text: &str,
    ) -> Result<SegmentAnalysis, IntelligenceError> {
        let body = structured_body(
            &prompts::extract_prompt(segment_title, raw_text),
            prompts::extract_schema(),
        );
        let generated = self.generate(&self.model, &body).await?;
        coerce_analysis(&generated.text).into_structured()
    }

    async fn bulk_extract(
        &self,
        narrative: &str,
        segment_ids: &[String],
    ) -> Result<SavedResearch, IntelligenceError> {
        let body = structured_body(
            &prompts::bulk_prompt(narrative, segment_ids),
            prompts::bulk_schema(),
        );
        let generated = self.generate(&self.bulk_model, &body).await?;
        coerce_bulk(&generated.text).into_structured()
    }

    async fn assistant_query(
        &self,
        topic: &str,
        context: &str,
        query: &str,
    ) -> Result<String, IntelligenceError> {
        let body = plain_body(&prompts::assistant_prompt(topic, context, query));
        let generated = self.generate(&self.model, &body).await?;
        Ok(or_fallback(generated.text, NO_RESPONSE))
    }
}

/// Create the configured [`Intelligence`] provider.
///
/// | Config Value | Provider |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledIntelligence`] |
/// | `"gemini"` | [`GeminiClient`] |
pub fn create_intelligence(config: &IntelligenceConfig) -> Result<Arc<dyn Intelligence>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledIntelligence)),
        "gemini" => Ok(Arc::new(GeminiClient::new(config)?)),
        other => bail!("Unknown intelligence provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_response() {
        let body = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Hello " }, { "text": "world" }] },
                "finishReason": "STOP"
            }]
        });
        let generated = parse_generated(&body).unwrap();
        assert_eq!(generated.text, "Hello world");
        assert!(generated.citations.is_empty());
    }

    #[test]
    fn test_parse_grounding_citations() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "answer" }] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example", "title": "A" } },
                        { "web": { "uri": "https://b.example" } },
                        { "retrievedContext": { "uri": "ignored" } }
                    ]
                }
            }]
        });
        let generated = parse_generated(&body).unwrap();
        assert_eq!(
            generated.citations,
            vec![
                Citation { url: "https://a.example".into(), title: "A".into() },
                Citation { url: "https://b.example".into(), title: "https://b.example".into() },
            ]
        );
    }

    #[test]
    fn test_parse_missing_candidates() {
        let err = parse_generated(&json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .unwrap_err();
        match err {
            IntelligenceError::ShapeMismatch { message } => assert!(message.contains("SAFETY")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_empty_candidates() {
        assert!(matches!(
            parse_generated(&json!({ "candidates": [] })),
            Err(IntelligenceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_retry_after() {
        use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 17 "));
        assert_eq!(parse_retry_after(&headers), Some(17));
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_map_status() {
        assert!(matches!(map_status(401, None, ""), IntelligenceError::Auth { .. }));
        assert!(matches!(map_status(403, None, ""), IntelligenceError::Auth { .. }));
        assert!(map_status(429, None, "").is_retryable());
        assert_eq!(
            map_status(429, None, ""),
            IntelligenceError::RateLimited { retry_after_secs: None }
        );
        assert_eq!(
            map_status(429, Some(12), ""),
            IntelligenceError::RateLimited { retry_after_secs: Some(12) }
        );
        assert!(map_status(503, None, "down").is_retryable());
        assert_eq!(
            map_status(400, None, "bad"),
            IntelligenceError::Rejected { status: 400, message: "bad".into() }
        );
    }

    #[test]
    fn test_structured_body_shape() {
        let body = structured_body("p", json!({ "type": "OBJECT" }));
        assert_eq!(body["contents"][0]["parts"][0]["text"], "p");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(grounded_body("p")["tools"][0].get("googleSearch").is_some());
        assert!(plain_body("p").get("generationConfig").is_none());
    }

    #[test]
    fn test_endpoint_url_trims_slash() {
        let cfg = IntelligenceConfig {
            provider: "gemini".into(),
            base_url: Some("http://127.0.0.1:1/v1beta/".into()),
            ..Default::default()
        };
        let client = GeminiClient::new_with_key(&cfg, "k".into()).unwrap();
        assert_eq!(
            client.endpoint_url("m"),
            "http://127.0.0.1:1/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn test_create_disabled() {
        let intel = create_intelligence(&IntelligenceConfig::default()).unwrap();
        assert_eq!(intel.name(), "disabled");
    }

    #[test]
    fn test_create_gemini_without_key_fails() {
        let cfg = IntelligenceConfig {
            provider: "gemini".into(),
            api_key_env: "LANDSCAPE_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(create_intelligence(&cfg).is_err());
    }
}
