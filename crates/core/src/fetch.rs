//! Page content retrieval through the rendering proxy.
//!
//! The pipeline never parses raw HTML itself: retrieval is delegated to a
//! reader service (Jina Reader by default) that renders the page and returns
//! a Markdown representation, which is what the extraction prompt consumes.
//! Oversized bodies are truncated to keep the prompt bounded.

#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use reqwest::Client;
#[cfg(feature = "fetch")]
use url::Url;

#[cfg(feature = "fetch")]
use crate::{FaveaError, Result};

/// Hard ceiling on fetched page content, in characters.
pub const MAX_CONTENT_LENGTH: usize = 100_000;

/// Appended when a page body was cut at [`MAX_CONTENT_LENGTH`].
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Configuration for the page-rendering reader service.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Base URL of the reader service. The target URL is appended as-is.
    pub endpoint: String,
    /// Request timeout in seconds. Rendering a heavy page can be slow,
    /// so this is considerably longer than the robots.txt timeout.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://r.jina.ai".to_string(),
            timeout: 60,
            user_agent: "Mozilla/5.0 (compatible; Favea/1.0; +https://favea.app)".to_string(),
        }
    }
}

/// Truncates page content at [`MAX_CONTENT_LENGTH`] characters.
///
/// Content at or under the ceiling passes through untouched; longer content
/// is cut at exactly the ceiling and [`TRUNCATION_MARKER`] is appended.
pub fn truncate_content(content: String) -> String {
    if content.chars().count() <= MAX_CONTENT_LENGTH {
        return content;
    }
    let mut truncated: String = content.chars().take(MAX_CONTENT_LENGTH).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Builds the search-engine URL used when the caller supplies a keyword
/// instead of an explicit page URL.
///
/// The query combines the keyword with live-ticket search terms and the
/// given calendar year.
pub fn search_url_for_keyword(keyword: &str, year: i32) -> String {
    let query = format!("{keyword} ライブ チケット {year}");
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    format!("https://www.google.com/search?q={encoded}")
}

/// Fetches a Markdown rendering of a web page through the reader service.
///
/// Callers are responsible for having run the robots.txt check first; this
/// function does not re-check permission. A non-success response from the
/// reader fails with [`FaveaError::UpstreamFetch`] carrying the upstream
/// status; successful bodies are truncated via [`truncate_content`].
#[cfg(feature = "fetch")]
pub async fn fetch_page_content(url: &str, config: &ReaderConfig) -> Result<String> {
    Url::parse(url).map_err(|e| FaveaError::InvalidUrl(e.to_string()))?;

    let reader_url = format!("{}/{}", config.endpoint.trim_end_matches('/'), url);

    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .build()
        .map_err(FaveaError::HttpError)?;

    let response = client
        .get(&reader_url)
        .header("Accept", "text/markdown")
        .header("X-Return-Format", "markdown")
        .header("User-Agent", &config.user_agent)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                FaveaError::Timeout { timeout: config.timeout }
            } else {
                FaveaError::HttpError(e)
            }
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FaveaError::UpstreamFetch { status: status.as_u16() });
    }

    let content = response.text().await?;

    Ok(truncate_content(content))
}
