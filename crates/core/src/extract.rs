//! Model-based event extraction.
//!
//! Given the Markdown rendering of a page, the [`Extractor`] builds a fixed
//! instruction prompt, invokes a chat-completions language model with a
//! bounded output budget, and parses the model's reply into
//! [`ExtractionResult`] records. Response parsing is a pure function
//! ([`parse_model_response`]) so the contract around the model — locate a
//! fenced JSON block or fall back to the raw text, stamp provenance, never
//! trust the echoed source URL — is testable without any network.

use std::sync::LazyLock;
#[cfg(feature = "fetch")]
use std::time::Duration;

use regex::Regex;
#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use serde_json::json;
#[cfg(feature = "fetch")]
use time::OffsetDateTime;
#[cfg(feature = "fetch")]
use tracing::debug;

use crate::draft::ExtractionResult;
use crate::{FaveaError, Result};

/// Fallback idol name when the model could not identify one.
pub const UNKNOWN_IDOL: &str = "Unknown";

/// Instruction block prepended to every extraction prompt.
///
/// The rules mirror what the product needs from the model: literal
/// extraction only, deterministic handling of partial dates, and a strict
/// JSON output shape.
const EXTRACTION_PROMPT: &str = r#"You are an event-information extraction assistant. From the web page content below, extract information about idol/artist events (live shows, concerts, handshake events, release events, fan meetings, and similar).

Extract for each event:
- title: the official event name
- event_date: ISO 8601 (YYYY-MM-DDTHH:mm:ss); date only if the time is not stated
- venue: name of the location
- deadlines: any of the following that appear
  - lottery_start: when lottery applications open
  - lottery_end: lottery application deadline
  - payment: payment due date

Important rules:
- Extract only information literally present on the page.
- Never guess or fabricate missing details.
- When a date is vague (e.g. "early March"), default to the first day of that month.
- When the year is not stated, infer it from the current year given below.
- If the page lists multiple events, extract every one of them.
- Also identify the name of the associated artist/idol.

Respond with JSON in exactly this shape, with no surrounding prose:
{
  "idol_name": "artist or idol name",
  "events": [
    {
      "title": "event name",
      "event_date": "2025-03-15T18:00:00",
      "venue": "venue name",
      "deadlines": [
        {
          "type": "lottery_end",
          "end_at": "2025-02-28T23:59:59",
          "description": "general lottery"
        }
      ]
    }
  ]
}

If no event information is found, return an empty events array.

---

Web page content:
"#;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("code fence pattern is valid")
});

/// Configuration for the extraction engine.
///
/// Built explicitly by the hosting process (server config, CLI flags) and
/// injected at construction; the engine never reads the environment itself.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Language-model API credential. Extraction fails with
    /// [`FaveaError::MissingApiKey`] when absent.
    pub api_key: Option<String>,
    /// Base URL of the chat-completions endpoint.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// Output-token budget for one extraction.
    pub max_tokens: u32,
    /// Sampling temperature. Low by default: extraction should be literal.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout: 120,
        }
    }
}

/// Builds the full prompt for one page.
pub fn build_prompt(page_content: &str, current_year: i32) -> String {
    format!("{EXTRACTION_PROMPT}{page_content}\n\nCurrent year: {current_year}")
}

/// Parses the model's textual reply into an [`ExtractionResult`].
///
/// Prefers the interior of the first fenced code block; when no fence is
/// present the raw text is parsed directly. Every event's `source_url` is
/// stamped with the URL that was actually fetched, an absent or blank
/// `idol_name` falls back to [`UNKNOWN_IDOL`], and the verbatim reply is
/// preserved in `raw_response` for diagnostics.
pub fn parse_model_response(text: &str, source_url: &str) -> Result<ExtractionResult> {
    let payload = match CODE_FENCE.captures(text) {
        Some(captures) => captures[1].trim().to_string(),
        None => text.trim().to_string(),
    };

    let mut result: ExtractionResult = serde_json::from_str(&payload).map_err(|_| {
        FaveaError::ExtractionFailed("failed to parse event information".to_string())
    })?;

    for event in &mut result.events {
        event.source_url = Some(source_url.to_string());
    }
    if result.idol_name.trim().is_empty() {
        result.idol_name = UNKNOWN_IDOL.to_string();
    }
    result.raw_response = Some(text.to_string());

    Ok(result)
}

/// The extraction engine: one configured model client.
#[cfg(feature = "fetch")]
pub struct Extractor {
    config: ExtractorConfig,
    client: Client,
}

#[cfg(feature = "fetch")]
impl Extractor {
    /// Creates an extractor from an explicit configuration.
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config, client: Client::new() }
    }

    /// Extracts structured event records from rendered page content.
    ///
    /// `source_url` is attached as provenance to every extracted event.
    pub async fn extract(&self, page_content: &str, source_url: &str) -> Result<ExtractionResult> {
        let api_key = self.config.api_key.as_deref().ok_or(FaveaError::MissingApiKey)?;

        let current_year = OffsetDateTime::now_utc().year();
        let prompt = build_prompt(page_content, current_year);

        let url = format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'));
        let payload = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(self.config.timeout))
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FaveaError::Timeout { timeout: self.config.timeout }
                } else {
                    FaveaError::HttpError(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FaveaError::ExtractionFailed(format!(
                "model request failed: HTTP {status}"
            )));
        }

        let envelope: serde_json::Value = serde_json::from_str(&body).map_err(|_| {
            FaveaError::ExtractionFailed("malformed completion response".to_string())
        })?;

        let text = envelope
            .pointer("/choices/0/message/content")
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(FaveaError::EmptyModelResponse)?;

        parse_model_response(text, source_url).inspect_err(|_| {
            // Raw model output stays in the logs; it never reaches callers.
            debug!(raw = text, "model response could not be parsed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DeadlineType;

    const MODEL_JSON: &str = r#"{
        "idol_name": "星野アイ",
        "events": [
            {
                "title": "1st LIVE",
                "event_date": "2026-04-15T18:00:00",
                "venue": "幕張メッセ",
                "deadlines": [
                    {"type": "lottery_end", "end_at": "2026-02-10T23:59:00"}
                ],
                "source_url": "https://attacker.example/echoed"
            }
        ]
    }"#;

    #[test]
    fn test_prompt_includes_content_and_year() {
        let prompt = build_prompt("page body here", 2026);
        assert!(prompt.contains("page body here"));
        assert!(prompt.contains("Current year: 2026"));
        assert!(prompt.starts_with("You are an event-information extraction assistant"));
    }

    #[test]
    fn test_parse_fenced_response() {
        let text = format!("Here is the result:\n```json\n{MODEL_JSON}\n```\nDone.");
        let result = parse_model_response(&text, "https://example.com/live").unwrap();
        assert_eq!(result.idol_name, "星野アイ");
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].deadlines[0].deadline_type, DeadlineType::LotteryEnd);
    }

    #[test]
    fn test_parse_bare_response() {
        let result = parse_model_response(MODEL_JSON, "https://example.com/live").unwrap();
        assert_eq!(result.events.len(), 1);
    }

    #[test]
    fn test_source_url_overrides_model_echo() {
        let result = parse_model_response(MODEL_JSON, "https://example.com/live").unwrap();
        assert_eq!(result.events[0].source_url.as_deref(), Some("https://example.com/live"));
    }

    #[test]
    fn test_unparsable_response_fails() {
        let result = parse_model_response("Sorry, I could not find any events.", "https://x");
        assert!(matches!(result, Err(FaveaError::ExtractionFailed(_))));
    }

    #[test]
    fn test_missing_idol_name_falls_back() {
        let result = parse_model_response(r#"{"events": []}"#, "https://x").unwrap();
        assert_eq!(result.idol_name, UNKNOWN_IDOL);
    }

    #[test]
    fn test_raw_response_preserved() {
        let result = parse_model_response(MODEL_JSON, "https://x").unwrap();
        assert!(result.raw_response.unwrap().contains("星野アイ"));
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_extract_without_api_key_fails_fast() {
        let extractor = Extractor::new(ExtractorConfig::default());
        let result = extractor.extract("content", "https://example.com").await;
        assert!(matches!(result, Err(FaveaError::MissingApiKey)));
    }
}
