//! server
//!
//! HTTP surface over the publish orchestrator.
//!
//! | Route | Method | Purpose |
//! |---|---|---|
//! | `/health` | GET | Liveness |
//! | `/api/save` | POST | Write draft or published documents |
//! | `/api/publish` | POST | Publish the most specific content |
//! | `/api/load` | GET | Read a (slug, channel) pair |
//! | `/api/games` | GET | List games under `public/games` |
//! | `/api/status` | GET | Store and branch head, cached |
//!
//! Every failure is returned as `{ok: false, error, message, ...}` with the
//! status category of the underlying [`PublishError`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::types::{Channel, Slug};
use crate::publish::{
    ErrorContext, Operation, Orchestrator, PublishError, PublishRequest, SaveRequest,
};
use crate::store::branch_cache::BranchCache;
use crate::store::ContentStore;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Only `/api/status` reads through this; save and publish resolve fresh.
    pub branch_cache: Arc<Mutex<BranchCache>>,
}

impl AppState {
    pub fn new(store: Arc<dyn ContentStore>, branch_ttl: Duration) -> Self {
        Self {
            orchestrator: Orchestrator::new(store),
            branch_cache: Arc::new(Mutex::new(BranchCache::new(branch_ttl))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoadParams {
    pub slug: Option<String>,
    pub channel: Option<String>,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn status_of(err: &PublishError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn error_response(err: &PublishError) -> Response {
    if err.is_client_error() {
        tracing::warn!(error = %err, "request rejected");
    } else {
        tracing::error!(error = %err, "request failed");
    }
    (status_of(err), Json(err.to_json())).into_response()
}

/// Parse a raw body as JSON. An empty body is treated as `{}` so the
/// request validators can name the missing field.
fn parse_body(body: &Bytes) -> Result<Value, PublishError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }
    serde_json::from_slice(body).map_err(|e| PublishError::Validation(format!("invalid JSON: {}", e)))
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/save", post(save))
        .route("/api/publish", post(publish))
        .route("/api/load", get(load))
        .route("/api/games", get(list_games))
        .route("/api/status", get(status))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;

    tracing::info!(
        addr = %listener.local_addr().context("listener has no local address")?,
        store = state.orchestrator.store().name(),
        "trailhead listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn save(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_body(&body).and_then(SaveRequest::from_json) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match state.orchestrator.save(request).await {
        Ok(outcome) => {
            let status = match outcome.first_error() {
                Some(err) => {
                    tracing::warn!(error = %err, "save partially failed");
                    status_of(err)
                }
                None => StatusCode::OK,
            };
            (status, Json(outcome.to_json())).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn publish(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match parse_body(&body).and_then(PublishRequest::from_json) {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };

    match state.orchestrator.publish(request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.to_json())).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn load(State(state): State<AppState>, Query(params): Query<LoadParams>) -> Response {
    let slug = match params.slug.as_deref().map(Slug::new) {
        Some(Ok(slug)) => slug,
        Some(Err(e)) => return error_response(&PublishError::Validation(e.to_string())),
        None => return error_response(&PublishError::Validation("slug is required".into())),
    };
    let channel = match params.channel.as_deref().map(str::parse::<Channel>) {
        None => Channel::default(),
        Some(Ok(channel)) => channel,
        Some(Err(e)) => return error_response(&PublishError::Validation(e.to_string())),
    };

    match state.orchestrator.load(&slug, channel).await {
        Ok(outcome) => {
            let mut body = json!({ "ok": true });
            if let (Value::Object(map), Ok(Value::Object(fields))) =
                (&mut body, serde_json::to_value(&outcome))
            {
                map.extend(fields);
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => error_response(&e),
    }
}

async fn list_games(State(state): State<AppState>) -> Response {
    match state.orchestrator.list_games().await {
        Ok(games) => (StatusCode::OK, Json(json!({ "ok": true, "games": games }))).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn status(State(state): State<AppState>) -> Response {
    let store = state.orchestrator.store();
    let (hit, ttl) = {
        let cache = state.branch_cache.lock().await;
        (cache.lookup(Utc::now()), cache.ttl())
    };

    // The lock is not held across the store call.
    let resolved = match hit {
        Some(hit) => Ok(hit),
        None => {
            let result = store.resolve_branch().await;
            state.branch_cache.lock().await.settle(result, Utc::now())
        }
    };

    match resolved {
        Ok(resolved) => (
            StatusCode::OK,
            Json(json!({
                "ok": true,
                "store": store.name(),
                "branch": resolved.branch.name,
                "sha": resolved.branch.sha,
                "fetchedAt": resolved.fetched_at,
                "cached": resolved.cached,
                "ttlSecs": ttl.as_secs(),
            })),
        )
            .into_response(),
        Err(e) => error_response(&PublishError::from_store(
            ErrorContext::new(Operation::Status, store.name()),
            e,
        )),
    }
}
