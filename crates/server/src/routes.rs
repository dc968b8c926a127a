//! HTTP surface of the collection pipeline.
//!
//! One endpoint drives both halves of the pipeline, selected by the request
//! `mode`: `extract` runs robots check → page fetch → model extraction and
//! returns drafts without persisting anything; `save` hands a user-confirmed
//! draft batch to the reconciler. A second endpoint returns the caller's
//! collection history. Every branch terminates in the success envelope or an
//! [`ApiError`] with its mapped status.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use deadpool_postgres::Pool;
use serde::Deserialize;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use favea_core::{
    EventDraft, Extractor, ReaderConfig, RobotsConfig, check_allowed, fetch_page_content,
    search_url_for_keyword,
};

use crate::auth;
use crate::error::ApiError;
use crate::reconcile;
use crate::store::EventStore;

/// Shared per-request context.
#[derive(Clone)]
pub struct AppState {
    pub pool: Pool,
    pub store: Arc<dyn EventStore>,
    pub robots: RobotsConfig,
    pub reader: ReaderConfig,
    pub extractor: Arc<Extractor>,
}

/// Which half of the pipeline a collect request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectMode {
    #[default]
    Extract,
    Save,
}

/// Body of `POST /api/collect`.
#[derive(Debug, Deserialize)]
pub struct CollectRequest {
    #[serde(default)]
    pub mode: CollectMode,
    pub keyword: Option<String>,
    pub url: Option<String>,
    pub idol_name: Option<String>,
    #[serde(default)]
    pub events: Vec<EventDraft>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/collect", post(collect))
        .route("/api/collect/history", get(history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Picks the page to collect from: an explicit URL wins, otherwise a search
/// URL is synthesized from the keyword.
fn resolve_target_url(url: Option<&str>, keyword: Option<&str>) -> Result<String, ApiError> {
    if let Some(url) = url.map(str::trim).filter(|u| !u.is_empty()) {
        return Ok(url.to_string());
    }
    if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
        let year = OffsetDateTime::now_utc().year();
        return Ok(search_url_for_keyword(keyword, year));
    }
    Err(ApiError::invalid_input("keyword or url is required"))
}

async fn collect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CollectRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth::authenticate(&state.pool, &headers).await?;

    match request.mode {
        CollectMode::Extract => run_extract(&state, &request).await,
        CollectMode::Save => {
            let idol_name = request.idol_name.as_deref().unwrap_or_default();
            let outcome =
                reconcile::save_drafts(state.store.as_ref(), user_id, idol_name, &request.events)
                    .await?;
            info!(user = %user_id, saved = outcome.saved_count, "save completed");
            Ok(Json(json!({
                "success": true,
                "data": {
                    "saved_count": outcome.saved_count,
                    "message": format!("Saved {} event(s).", outcome.saved_count),
                }
            })))
        }
    }
}

async fn run_extract(state: &AppState, request: &CollectRequest) -> Result<Json<Value>, ApiError> {
    let target = resolve_target_url(request.url.as_deref(), request.keyword.as_deref())?;

    info!(target = %target, "extract: checking crawl permission");
    let decision = check_allowed(&target, &state.robots).await;
    if !decision.allowed {
        let reason = decision
            .reason
            .unwrap_or_else(|| "this site does not permit automated collection".to_string());
        return Err(ApiError::forbidden(reason));
    }

    let content = fetch_page_content(&target, &state.reader).await?;
    let result = state.extractor.extract(&content, &target).await?;
    info!(target = %target, events = result.events.len(), "extract completed");

    // Drafts only: nothing is persisted until the user confirms via save.
    Ok(Json(json!({
        "success": true,
        "data": {
            "idol_name": result.idol_name,
            "events": result.events,
            "message": "Collection finished. Review the extracted events before saving.",
        }
    })))
}

async fn history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let user_id = auth::authenticate(&state.pool, &headers).await?;

    let items = state.store.list_user_events(user_id).await.map_err(|err| {
        warn!(user = %user_id, error = %err, "history lookup failed");
        ApiError::internal()
    })?;

    Ok(Json(json!({ "success": true, "data": items })))
}
