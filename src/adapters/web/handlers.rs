//! HTTP request handlers for the web adapter.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::pipeline::PipelineKind;

use super::{AppState, WebError};

#[derive(Debug, Deserialize)]
pub struct CoinRequest {
    pub coin: String,
}

pub async fn index() -> Response {
    json_response(
        serde_json::json!({
            "message": "deepcoin: POST {\"coin\": id} to /v1/scrapeCoinGecko or /v1/predictPrice"
        })
        .to_string(),
    )
}

pub async fn scrape_coingecko(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CoinRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    run_pipeline(&state, payload, PipelineKind::Indicators).await
}

pub async fn predict_price(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CoinRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    run_pipeline(&state, payload, PipelineKind::Forecast).await
}

pub async fn not_found() -> WebError {
    WebError::not_found("not found")
}

async fn run_pipeline(
    state: &AppState,
    payload: Result<Json<CoinRequest>, JsonRejection>,
    kind: PipelineKind,
) -> Result<Response, WebError> {
    let Json(request) = payload.map_err(|e| WebError::bad_request(e.body_text()))?;
    if request.coin.trim().is_empty() {
        return Err(WebError::bad_request("coin must not be empty"));
    }
    let body = state
        .orchestrator
        .get_or_compute(&request.coin, kind)
        .await?;
    Ok(json_response(body))
}

fn json_response(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}
