//! Uniform API error type for every route branch.
//!
//! Each failure is tagged with an [`ErrorKind`] that maps onto one HTTP
//! status; handlers return `Result<Json<_>, ApiError>` and the
//! `IntoResponse` impl renders the `{ "error": … }` envelope. Raw upstream
//! detail (reader status codes, model output) is logged here and never
//! leaves the process.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use favea_core::FaveaError;

/// Classifies an [`ApiError`] onto an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request input (400).
    InvalidInput,
    /// Missing or invalid session (401).
    Unauthorized,
    /// The target site's robots.txt denies collection (403).
    Forbidden,
    /// The page-rendering service failed (502).
    UpstreamFetch,
    /// Model configuration, invocation, or output parsing failed (500).
    Extraction,
    /// Anything else (500).
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::UpstreamFetch => StatusCode::BAD_GATEWAY,
            ErrorKind::Extraction | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A request-terminating error with its caller-visible message.
#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::InvalidInput, message: message.into() }
    }

    pub fn unauthorized() -> Self {
        Self { kind: ErrorKind::Unauthorized, message: "authentication required".to_string() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Forbidden, message: message.into() }
    }

    pub fn internal() -> Self {
        Self { kind: ErrorKind::Internal, message: "an unexpected server error occurred".to_string() }
    }
}

impl From<FaveaError> for ApiError {
    fn from(err: FaveaError) -> Self {
        match err {
            FaveaError::UpstreamFetch { status } => {
                // Upstream status is for the logs; callers get a generic message.
                warn!(status, "page rendering service returned an error");
                Self {
                    kind: ErrorKind::UpstreamFetch,
                    message: "failed to fetch the page".to_string(),
                }
            }
            FaveaError::InvalidUrl(detail) => Self::invalid_input(format!("invalid URL: {detail}")),
            FaveaError::MissingApiKey
            | FaveaError::EmptyModelResponse
            | FaveaError::ExtractionFailed(_) => {
                Self { kind: ErrorKind::Extraction, message: err.to_string() }
            }
            FaveaError::HttpError(_) | FaveaError::Timeout { .. } => {
                warn!(error = %err, "pipeline transport failure");
                Self::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.kind.status(), Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::InvalidInput.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorKind::UpstreamFetch.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ErrorKind::Extraction.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_upstream_status_not_exposed() {
        let err = ApiError::from(FaveaError::UpstreamFetch { status: 503 });
        assert_eq!(err.kind, ErrorKind::UpstreamFetch);
        assert!(!err.message.contains("503"));
    }

    #[test]
    fn test_extraction_errors_map_to_500() {
        let err = ApiError::from(FaveaError::MissingApiKey);
        assert_eq!(err.kind, ErrorKind::Extraction);

        let err = ApiError::from(FaveaError::ExtractionFailed(
            "failed to parse event information".to_string(),
        ));
        assert_eq!(err.message, "failed to parse event information");
    }
}
