//! robots.txt parsing and crawl-permission checks.
//!
//! Before the pipeline hands a URL to the page-rendering service, it fetches
//! the site's `/robots.txt` and evaluates whether automated retrieval of that
//! path is permitted. The policy evaluation is deliberately split from the
//! network fetch so it can be tested without a server:
//! [`evaluate_policy`] is a pure function over (status, body, path), and
//! [`check_allowed`] is the thin fetch wrapper around it.
//!
//! Failure handling is asymmetric by design: a missing or unreachable
//! robots.txt allows the fetch (the real request will surface any genuine
//! problem), while a 5xx from the policy endpoint denies it.

#[cfg(feature = "fetch")]
use std::time::Duration;

use regex::Regex;

#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use url::Url;

/// Agent names whose directive groups apply to this pipeline, besides `*`.
/// Page retrieval goes through the Jina reader, so sites addressing that
/// crawler directly are honored too.
const FETCHER_AGENTS: &[&str] = &["jina", "jinaai"];

/// Configuration for robots.txt retrieval.
#[derive(Debug, Clone)]
pub struct RobotsConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Identifying User-Agent sent when fetching the policy file.
    pub user_agent: String,
}

impl Default for RobotsConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            user_agent: "Mozilla/5.0 (compatible; Favea/1.0; +https://favea.app)".to_string(),
        }
    }
}

/// Outcome of a crawl-permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlDecision {
    /// Whether fetching the URL is permitted.
    pub allowed: bool,
    /// Human-readable reason, set when the fetch is denied.
    pub reason: Option<String>,
}

impl CrawlDecision {
    fn allow() -> Self {
        Self { allowed: true, reason: None }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self { allowed: false, reason: Some(reason.into()) }
    }
}

/// One `Allow:`/`Disallow:` directive from a relevant agent group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RobotsRule {
    /// Path pattern, possibly containing `*` wildcards and a trailing `$`.
    pub path: String,
    /// `true` for `Allow:`, `false` for `Disallow:`.
    pub allow: bool,
}

/// Parses robots.txt content into the rules relevant to this fetcher.
///
/// Tracks the active `User-agent:` group while scanning line by line; only
/// `Allow:`/`Disallow:` directives inside a group naming `*` or one of
/// [`FETCHER_AGENTS`] (case-insensitive) are collected. Comments (`#` to end
/// of line) and blank lines are skipped. Directives with an empty path are
/// ignored.
pub fn parse_robots_txt(content: &str) -> Vec<RobotsRule> {
    let mut rules = Vec::new();
    let mut relevant_group = false;

    for raw in content.lines() {
        let line = match raw.find('#') {
            Some(idx) => &raw[..idx],
            None => raw,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let lower = line.to_ascii_lowercase();
        if let Some(agent) = lower.strip_prefix("user-agent:") {
            let agent = agent.trim();
            relevant_group = agent == "*" || FETCHER_AGENTS.contains(&agent);
            continue;
        }

        if !relevant_group {
            continue;
        }

        // Detect the directive case-insensitively but keep the path's
        // original case for matching.
        if lower.starts_with("disallow:") {
            let path = line["disallow:".len()..].trim();
            if !path.is_empty() {
                rules.push(RobotsRule { path: path.to_string(), allow: false });
            }
        } else if lower.starts_with("allow:") {
            let path = line["allow:".len()..].trim();
            if !path.is_empty() {
                rules.push(RobotsRule { path: path.to_string(), allow: true });
            }
        }
    }

    rules
}

/// Tests whether a URL path matches a single rule pattern.
///
/// Patterns containing `*` compile to a prefix-anchored regex where `*`
/// matches any substring and a trailing `$` anchors the end. Patterns
/// without a wildcard match as a literal prefix.
fn rule_matches(url_path: &str, rule_path: &str) -> bool {
    if rule_path.contains('*') {
        let (body, anchored) = match rule_path.strip_suffix('$') {
            Some(stripped) => (stripped, true),
            None => (rule_path, false),
        };
        let mut pattern = String::from("^");
        pattern.push_str(
            &body
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*"),
        );
        if anchored {
            pattern.push('$');
        }
        match Regex::new(&pattern) {
            Ok(re) => re.is_match(url_path),
            Err(_) => false,
        }
    } else {
        url_path.starts_with(rule_path)
    }
}

/// Evaluates a robots.txt response against a URL path.
///
/// Status semantics: 404 allows (no policy published), 5xx denies (the site
/// could not tell us its policy, fail closed), any other non-success allows.
/// On success the body is parsed and the most specific matching rule wins:
/// longest pattern first, with equal-length conflicts resolved toward
/// `Disallow` as the documented deterministic tie-break. No matching rule
/// means the path is unrestricted.
pub fn evaluate_policy(status: u16, body: &str, url_path: &str) -> CrawlDecision {
    if status == 404 {
        return CrawlDecision::allow();
    }
    if status >= 500 {
        return CrawlDecision::deny("failed to retrieve the site's robots.txt");
    }
    if !(200..300).contains(&status) {
        return CrawlDecision::allow();
    }

    let mut rules = parse_robots_txt(body);
    if rules.is_empty() {
        return CrawlDecision::allow();
    }

    // Stable sort: longer (more specific) patterns first, Disallow before
    // Allow at equal length, original order otherwise.
    rules.sort_by(|a, b| {
        b.path
            .len()
            .cmp(&a.path.len())
            .then_with(|| a.allow.cmp(&b.allow))
    });

    for rule in &rules {
        if rule_matches(url_path, &rule.path) {
            if rule.allow {
                return CrawlDecision::allow();
            }
            return CrawlDecision::deny(format!(
                "this site does not permit automated collection (Disallow: {})",
                rule.path
            ));
        }
    }

    CrawlDecision::allow()
}

/// Checks whether automated retrieval of `url` is permitted by the site's
/// robots.txt.
///
/// Everything that prevents the policy from being evaluated at all — a
/// malformed URL, a connect failure, an unreadable body — resolves to
/// "allowed": the downstream content fetch performs the real validation and
/// surfaces the real error.
#[cfg(feature = "fetch")]
pub async fn check_allowed(url: &str, config: &RobotsConfig) -> CrawlDecision {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(_) => return CrawlDecision::allow(),
    };

    let robots_url = format!("{}/robots.txt", parsed.origin().ascii_serialization());

    let mut url_path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        url_path.push('?');
        url_path.push_str(query);
    }

    let client = match Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
    {
        Ok(client) => client,
        Err(_) => return CrawlDecision::allow(),
    };

    let response = match client
        .get(&robots_url)
        .header("User-Agent", &config.user_agent)
        .send()
        .await
    {
        Ok(response) => response,
        Err(_) => return CrawlDecision::allow(),
    };

    let status = response.status().as_u16();
    let body = if (200..300).contains(&status) {
        response.text().await.unwrap_or_default()
    } else {
        String::new()
    };

    evaluate_policy(status, &body, &url_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_collects_only_relevant_groups() {
        let content = "User-agent: Googlebot\nDisallow: /private\n\nUser-agent: *\nDisallow: /search\nAllow: /search/public\n";
        let rules = parse_robots_txt(content);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].path, "/search");
        assert!(!rules[0].allow);
        assert_eq!(rules[1].path, "/search/public");
        assert!(rules[1].allow);
    }

    #[test]
    fn test_parse_honors_fetcher_identity() {
        let content = "User-agent: JinaAI\nDisallow: /members\n";
        let rules = parse_robots_txt(content);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].path, "/members");
    }

    #[test]
    fn test_parse_strips_comments_and_blanks() {
        let content = "# policy file\nUser-agent: * # everyone\n\nDisallow: /admin # staff only\nDisallow:\n";
        let rules = parse_robots_txt(content);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].path, "/admin");
    }

    #[rstest]
    #[case("/search/results", "/search", true)]
    #[case("/about", "/search", false)]
    #[case("/search.php?q=x", "/search*.php", true)]
    #[case("/search/deep.php", "/search*.php", true)]
    #[case("/files/report.pdf", "*.pdf$", true)]
    #[case("/files/report.pdf?dl=1", "*.pdf$", false)]
    fn test_rule_matching(#[case] path: &str, #[case] rule: &str, #[case] expected: bool) {
        assert_eq!(rule_matches(path, rule), expected);
    }

    #[test]
    fn test_404_allows_regardless_of_body() {
        let decision = evaluate_policy(404, "User-agent: *\nDisallow: /", "/anything");
        assert!(decision.allowed);
    }

    #[rstest]
    #[case(500)]
    #[case(503)]
    fn test_server_error_denies(#[case] status: u16) {
        let decision = evaluate_policy(status, "", "/page");
        assert!(!decision.allowed);
        assert!(decision.reason.is_some());
    }

    #[rstest]
    #[case(401)]
    #[case(403)]
    #[case(301)]
    fn test_other_non_success_allows(#[case] status: u16) {
        assert!(evaluate_policy(status, "", "/page").allowed);
    }

    #[test]
    fn test_no_relevant_rules_allows() {
        let body = "User-agent: Googlebot\nDisallow: /\n";
        assert!(evaluate_policy(200, body, "/events").allowed);
    }

    #[test]
    fn test_disallow_names_blocking_pattern() {
        let body = "User-agent: *\nDisallow: /search\n";
        let decision = evaluate_policy(200, body, "/search?q=live");
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("/search"));
    }

    #[test]
    fn test_longer_pattern_wins() {
        let body = "User-agent: *\nDisallow: /search\nAllow: /search/public\n";
        assert!(evaluate_policy(200, body, "/search/public/x").allowed);
        assert!(!evaluate_policy(200, body, "/search/private").allowed);
    }

    #[test]
    fn test_equal_length_tie_prefers_disallow() {
        let body = "User-agent: *\nAllow: /data\nDisallow: /data\n";
        let decision = evaluate_policy(200, body, "/data/feed");
        assert!(!decision.allowed);
    }

    #[test]
    fn test_no_matching_rule_allows() {
        let body = "User-agent: *\nDisallow: /admin\n";
        assert!(evaluate_policy(200, body, "/events/123").allowed);
    }

    #[cfg(feature = "fetch")]
    #[tokio::test]
    async fn test_malformed_url_fails_open() {
        let decision = check_allowed("not a url at all", &RobotsConfig::default()).await;
        assert!(decision.allowed);
    }
}
