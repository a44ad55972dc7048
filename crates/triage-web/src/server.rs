//! Axum web server for the triage form

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use triage_orchestrator::Triage;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub triage: Arc<dyn Triage>,
}

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub input: String,
}

/// Report text plus its JSON reading, when it is JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub report: String,
    pub parsed: Option<Value>,
}

/// Build the application router
pub fn router(triage: Arc<dyn Triage>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/health", get(health))
        .fallback(crate::assets::static_handler)
        .layer(CorsLayer::permissive())
        .with_state(AppState { triage })
}

/// Serve the form on `addr`
pub async fn serve(triage: Arc<dyn Triage>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(triage)).await?;
    Ok(())
}

/// The report as JSON, if it is a JSON document
pub fn parse_report(report: &str) -> Option<Value> {
    serde_json::from_str(report.trim()).ok()
}

/// POST /api/analyze - Run a triage request
async fn analyze(
    State(app): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<Value>)> {
    let input = request.input.trim();
    if input.is_empty() {
        tracing::warn!("Rejected empty analyze request");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "warning": "Please enter some code or upload a file." })),
        ));
    }

    tracing::info!(chars = input.len(), "Analyzing request");
    let report = app.triage.debug_tool_issue(input).await;
    let parsed = parse_report(&report);

    Ok(Json(AnalyzeResponse { report, parsed }))
}

/// GET /api/health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "triage-web"
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        assert_eq!(
            parse_report(" {\"bug_found\": true} "),
            Some(json!({ "bug_found": true }))
        );
        assert_eq!(parse_report("Severity: low"), None);
    }
}
