//! Local HTTP relay between the UI and the language model.

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;

use super::{user_prompt, LlmClient, ReportRequest, ReportResponse, SYSTEM_PROMPT};
use crate::error::ReportError;

const GENERIC_ERROR: &str = "Error generating report";

struct RelayState {
    llm: LlmClient,
}

/// Any relay failure. Details are logged; clients only see a generic message.
enum RelayError {
    BadRequest(JsonRejection),
    Model(ReportError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        match &self {
            RelayError::BadRequest(rejection) => {
                log::warn!("Rejected report request: {}", rejection.body_text())
            }
            RelayError::Model(e) => log::error!("Error calling language model: {e}"),
        }
        let body = ReportResponse {
            report: None,
            error: Some(GENERIC_ERROR.into()),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub fn router(llm: LlmClient) -> Router {
    Router::new()
        .route("/api/generate-report", post(generate_report))
        .with_state(Arc::new(RelayState { llm }))
}

async fn generate_report(
    State(state): State<Arc<RelayState>>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, RelayError> {
    let Json(req) = payload.map_err(RelayError::BadRequest)?;
    log::info!(
        "Generating report (deepfake={}, {} frames)",
        req.is_likely_deepfake,
        req.top_frames.len()
    );
    let report = state
        .llm
        .complete(SYSTEM_PROMPT, &user_prompt(&req))
        .await
        .map_err(RelayError::Model)?;

    Ok(Json(ReportResponse {
        report: Some(report),
        error: None,
    }))
}

/// Serve the relay on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    llm: LlmClient,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Report relay listening on http://{addr}/api/generate-report");
    }
    if !llm.is_configured() {
        log::warn!("No language model API key configured; report requests will fail");
    }
    axum::serve(listener, router(llm))
        .with_graceful_shutdown(shutdown)
        .await
}
