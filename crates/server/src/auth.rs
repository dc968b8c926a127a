//! Bearer-token session authentication.
//!
//! Both collection routes require a session: the caller presents
//! `Authorization: Bearer <token>`, the token is hashed with SHA-256 and
//! looked up in the `sessions` table. Only the hash is ever stored or
//! compared; session issuance itself belongs to the auth service upstream
//! of this pipeline.

use axum::http::{HeaderMap, header};
use deadpool_postgres::Pool;
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// Extracts the bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Lowercase hex SHA-256 of a session token.
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Resolves the authenticated user for a request.
///
/// Missing header, unknown token, and expired session all collapse into the
/// same generic 401; infrastructure failures during lookup are a 500, not a
/// denial.
pub async fn authenticate(pool: &Pool, headers: &HeaderMap) -> Result<Uuid, ApiError> {
    let token = bearer_token(headers).ok_or_else(ApiError::unauthorized)?;
    let digest = token_digest(token);

    let client = pool.get().await.map_err(|err| {
        warn!(error = %err, "session lookup: pool unavailable");
        ApiError::internal()
    })?;

    let row = client
        .query_opt(
            "SELECT user_id FROM sessions WHERE token_hash = $1 AND expires_at > now()",
            &[&digest],
        )
        .await
        .map_err(|err| {
            warn!(error = %err, "session lookup failed");
            ApiError::internal()
        })?;

    row.map(|r| r.get(0)).ok_or_else(ApiError::unauthorized)
}
