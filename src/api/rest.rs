// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  The trigger endpoint spawns the run
// in the background and answers immediately: callers never block on metric
// retrieval or notification delivery.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::app_state::AppState;
use crate::pipeline::Sentinel;

/// Shared context handed to every handler.
#[derive(Clone)]
pub struct ApiContext {
    pub app: Arc<AppState>,
    pub sentinel: Arc<Sentinel>,
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(app: Arc<AppState>, sentinel: Arc<Sentinel>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let context = ApiContext { app, sentinel };

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/run", post(trigger_run))
        .route("/api/v1/runs", get(recent_runs))
        .route("/api/v1/errors", get(recent_errors))
        .route("/api/v1/config", get(config_snapshot))
        .layer(cors)
        .with_state(context)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
}

async fn health(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: ctx.app.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: ctx.app.start_time.elapsed().as_secs(),
    };
    Json(resp)
}

// =============================================================================
// Manual run trigger
// =============================================================================

#[derive(Serialize)]
struct TriggerResponse {
    status: &'static str,
}

/// Spawn one pipeline run and answer 202 immediately.  The caller polls
/// `/api/v1/runs` for the result.
async fn trigger_run(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let sentinel = ctx.sentinel.clone();
    let app = ctx.app.clone();

    tokio::spawn(async move {
        if let Err(e) = sentinel.run_once().await {
            error!(error = %e, "triggered run failed");
            app.push_error(format!("triggered run failed: {e:#}"));
        }
    });

    (StatusCode::ACCEPTED, Json(TriggerResponse { status: "scheduled" }))
}

// =============================================================================
// Recent runs & errors
// =============================================================================

async fn recent_runs(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let runs = ctx.app.recent_runs.read().clone();
    Json(runs)
}

async fn recent_errors(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let errors = ctx.app.recent_errors.read().clone();
    Json(errors)
}

// =============================================================================
// Config snapshot
// =============================================================================

async fn config_snapshot(State(ctx): State<ApiContext>) -> impl IntoResponse {
    let config = ctx.app.config.read().clone();
    Json(config)
}
