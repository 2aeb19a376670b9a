use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::intake::intake;
use crate::state::AppState;
use crate::ws::ws_handler;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
  pub status: &'static str,
  pub uptime_secs: u64,
  pub workflows: usize,
  pub runs: usize,
  pub sessions: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
  let router = state.router.lock().await;
  Json(HealthResponse {
    status: "healthy",
    uptime_secs: state.started_at.elapsed().as_secs(),
    workflows: router.list_workflows().len(),
    runs: router.list_workflow_runs().len(),
    sessions: router.sessions().len(),
  })
}

/// Build the HTTP application.
pub fn build_router(state: AppState) -> Router {
  Router::new()
    .route("/health", get(health))
    .route("/intake", post(intake))
    .route("/ws", get(ws_handler))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
