//! Library API integration tests
use favea_core::*;

const POLICY: &str = "\
# site policy
User-agent: Googlebot
Disallow: /

User-agent: *
Disallow: /search
Allow: /search/public
Disallow: /*.pdf$
";

#[test]
fn test_policy_evaluation_api() {
    assert!(!evaluate_policy(200, POLICY, "/search?q=live").allowed);
    assert!(evaluate_policy(200, POLICY, "/search/public/events").allowed);
    assert!(evaluate_policy(200, POLICY, "/news/2026").allowed);
    assert!(!evaluate_policy(200, POLICY, "/flyers/tour.pdf").allowed);
}

#[test]
fn test_policy_rules_keep_declaration_shape() {
    let rules = parse_robots_txt(POLICY);
    assert_eq!(rules.len(), 3);
    assert!(rules.iter().any(|r| r.path == "/search/public" && r.allow));
}

#[test]
fn test_extraction_round_trip_shape() {
    let reply = r#"```json
{
  "idol_name": "星野アイ",
  "events": [
    {
      "title": "Spring Tour Final",
      "event_date": "2026-05-01T17:30:00",
      "venue": "日本武道館",
      "deadlines": [
        {"type": "lottery_start", "start_at": "2026-02-01T10:00:00", "end_at": "2026-02-01T10:00:00"},
        {"type": "lottery_end", "end_at": "2026-02-10T23:59:00"},
        {"type": "payment", "end_at": "2026-03-05T23:59:00", "description": "convenience store payment"}
      ]
    }
  ]
}
```"#;

    let extracted = parse_model_response(reply, "https://tour.example.com/final").unwrap();
    assert_eq!(extracted.idol_name, "星野アイ");
    assert_eq!(extracted.events[0].deadlines.len(), 3);

    // What the extractor produces must survive the save request body intact.
    let body = serde_json::to_string(&extracted.events).unwrap();
    let back: Vec<EventDraft> = serde_json::from_str(&body).unwrap();
    assert_eq!(back, extracted.events);
    assert_eq!(back[0].source_url.as_deref(), Some("https://tour.example.com/final"));
}

#[test]
fn test_truncation_bounds_prompt_input() {
    let oversized = "event ".repeat(MAX_CONTENT_LENGTH);
    let bounded = truncate_content(oversized);
    assert!(bounded.chars().count() <= MAX_CONTENT_LENGTH + TRUNCATION_MARKER.chars().count());
    assert!(bounded.ends_with(TRUNCATION_MARKER));
}

#[test]
fn test_keyword_search_url() {
    let url = search_url_for_keyword("B小町", 2026);
    assert!(url.contains("google.com/search"));
    let parsed = url::Url::parse(&url).unwrap();
    let q = parsed.query_pairs().find(|(k, _)| k == "q").unwrap().1;
    assert!(q.contains("B小町"));
    assert!(q.contains("2026"));
}
