//! Error types for Favea pipeline operations.
//!
//! This module defines the main error type [`FaveaError`] which represents
//! all possible errors that can occur while fetching rendered page content
//! and extracting structured event information from it.
//!
//! # Example
//!
//! ```rust
//! use favea_core::{FaveaError, Result};
//!
//! fn require_content(markdown: &str) -> Result<&str> {
//!     if markdown.is_empty() {
//!         return Err(FaveaError::EmptyModelResponse);
//!     }
//!     Ok(markdown)
//! }
//! ```

use thiserror::Error;

/// Main error type for the collection pipeline.
///
/// This enum represents all possible errors that can occur during
/// crawl-permission checks, content fetching, and model-based extraction.
#[derive(Error, Debug)]
pub enum FaveaError {
    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The page-rendering service answered with a non-success status.
    ///
    /// The status code is kept for logging; callers surface a generic
    /// fetch-failure message to end users.
    #[error("Failed to fetch page content: HTTP {status}")]
    UpstreamFetch { status: u16 },

    /// No language-model credential was configured.
    ///
    /// Extraction refuses to run without an API key; the key is injected
    /// through [`ExtractorConfig`](crate::ExtractorConfig), never read from
    /// the environment mid-call.
    #[error("Language model API key is not configured")]
    MissingApiKey,

    /// The language model returned a response with no usable text content.
    #[error("The model response contained no text content")]
    EmptyModelResponse,

    /// The model's text could not be parsed into event records.
    ///
    /// The raw model output is logged by callers for diagnosis; it is never
    /// included in the error message shown to users.
    #[error("{0}")]
    ExtractionFailed(String),
}

/// Result type alias for FaveaError.
///
/// This is a convenience alias for `std::result::Result<T, FaveaError>`.
pub type Result<T> = std::result::Result<T, FaveaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FaveaError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = FaveaError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_upstream_fetch_keeps_status() {
        let err = FaveaError::UpstreamFetch { status: 502 };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn test_extraction_failed_message_passthrough() {
        let err = FaveaError::ExtractionFailed("failed to parse event information".to_string());
        assert_eq!(err.to_string(), "failed to parse event information");
    }
}
