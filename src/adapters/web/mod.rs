//! HTTP surface for the two pipelines.
//!
//! Both POST routes take `{"coin": "<id>"}` and answer with the
//! orchestrator's serialized body verbatim, so repeated requests for one
//! asset are byte-identical.

mod error;
mod handlers;

pub use error::{status_for, WebError};
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::domain::error::DeepcoinError;
use crate::domain::pipeline::PipelineOrchestrator;

pub struct AppState {
    pub orchestrator: Arc<PipelineOrchestrator>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/v1/scrapeCoinGecko", post(handlers::scrape_coingecko))
        .route("/v1/predictPrice", post(handlers::predict_price))
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `listen` and serve until the process is stopped.
pub async fn serve(listen: &str, state: AppState) -> Result<(), DeepcoinError> {
    let listener = tokio::net::TcpListener::bind(listen).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
