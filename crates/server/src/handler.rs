//! HTTP routes.
//!
//! - `POST /analyze` with `{ "url": string }` returns `{ "cached": bool, "data": report }`
//! - `GET /health` returns `{ "ok": true }`

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use siteintel_core::{AnalysisResult, Error};
use tower_http::trace::TraceLayer;

use crate::analyzer::Analyzer;
use crate::error::ApiError;

/// Body of `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Successful `POST /analyze` response.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub cached: bool,
    pub data: Arc<AnalysisResult>,
}

/// Build the application router around an analyzer.
pub fn router(analyzer: Analyzer) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(analyzer)
}

async fn analyze(
    State(analyzer): State<Analyzer>, body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = body.map_err(|e| Error::InvalidUrl(format!("unreadable request body: {e}")))?;

    let url = request.url.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        return Err(Error::InvalidUrl("missing url".into()).into());
    }

    let analysis = analyzer.analyze(url).await?;

    Ok(Json(AnalyzeResponse { cached: analysis.cached, data: analysis.data }))
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}
