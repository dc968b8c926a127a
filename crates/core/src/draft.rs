//! Draft event records produced by the extraction engine.
//!
//! These types describe the transient, not-yet-persisted shape of an
//! extracted event: they are what the model emits, what the UI lets the
//! user review and edit, and what the save endpoint finally persists.
//! Timestamps stay as the ISO-8601 strings the model produced; they are
//! validated and parsed at the storage boundary, not here.

use serde::{Deserialize, Serialize};

/// Kind of time-bound action window attached to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineType {
    /// Start of the ticket lottery application window.
    LotteryStart,
    /// End of the lottery application window.
    LotteryEnd,
    /// Payment due date for won tickets.
    Payment,
}

impl DeadlineType {
    /// Wire/database name for the deadline type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeadlineType::LotteryStart => "lottery_start",
            DeadlineType::LotteryEnd => "lottery_end",
            DeadlineType::Payment => "payment",
        }
    }
}

/// A single deadline attached to an extracted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadlineDraft {
    /// Deadline kind. Serialized as `type` on the wire.
    #[serde(rename = "type")]
    pub deadline_type: DeadlineType,
    /// Optional window start, ISO-8601.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    /// Window end, ISO-8601. The only mandatory timestamp.
    pub end_at: String,
    /// Free-text note, e.g. which lottery round this is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// An event extracted from a page but not yet saved by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event title as written on the page.
    pub title: String,
    /// Event date/time, ISO-8601, when the page states one.
    #[serde(default)]
    pub event_date: Option<String>,
    /// Venue name, when the page states one.
    #[serde(default)]
    pub venue: Option<String>,
    /// Deadlines found for this event.
    #[serde(default)]
    pub deadlines: Vec<DeadlineDraft>,
    /// Page the event was extracted from. Always stamped by the extractor
    /// with the URL it actually fetched; the model is not trusted to echo it.
    #[serde(default)]
    pub source_url: Option<String>,
}

/// Everything the extraction engine learned from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Name of the idol/artist the page is about. `"Unknown"` when the
    /// model could not identify one.
    #[serde(default)]
    pub idol_name: String,
    /// All events found on the page. Empty when the page mentions none.
    #[serde(default)]
    pub events: Vec<EventDraft>,
    /// Verbatim model output, kept for diagnostics only. Never sent back
    /// to API callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&DeadlineType::LotteryEnd).unwrap(),
            "\"lottery_end\""
        );
        assert_eq!(DeadlineType::Payment.as_str(), "payment");
    }

    #[test]
    fn test_event_draft_deserializes_model_shape() {
        let json = r#"{
            "title": "星野アイ 1st LIVE",
            "event_date": "2026-04-15T18:00:00",
            "venue": "幕張メッセ",
            "deadlines": [
                {"type": "lottery_end", "end_at": "2026-02-10T23:59:00", "description": "一般抽選"}
            ]
        }"#;

        let draft: EventDraft = serde_json::from_str(json).unwrap();
        assert_eq!(draft.title, "星野アイ 1st LIVE");
        assert_eq!(draft.deadlines.len(), 1);
        assert_eq!(draft.deadlines[0].deadline_type, DeadlineType::LotteryEnd);
        assert!(draft.deadlines[0].start_at.is_none());
        assert!(draft.source_url.is_none());
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let draft: EventDraft = serde_json::from_str(r#"{"title": "Live"}"#).unwrap();
        assert!(draft.event_date.is_none());
        assert!(draft.venue.is_none());
        assert!(draft.deadlines.is_empty());
    }

    #[test]
    fn test_raw_response_not_serialized_when_absent() {
        let result = ExtractionResult {
            idol_name: "Unknown".to_string(),
            events: vec![],
            raw_response: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("raw_response").is_none());
    }
}
