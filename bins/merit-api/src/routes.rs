//! Axum router and HTTP handlers.
//!
//! The HTTP layer owns status-code mapping: business rejections from the
//! engine become 400 with the reason echoed back, infrastructure faults
//! become 500. Nothing is clamped or swallowed.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use merit_core::constants::{DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT};
use merit_core::error::MeritError;
use merit_core::types::{IdentityId, ReputationSnapshot};

use crate::AppState;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/reputation/leaderboard", get(api_leaderboard))
        .route("/api/reputation/:user_id", get(api_snapshot))
        .route("/api/reputation/award", post(api_award))
        .route("/api/reputation/deduct", post(api_deduct))
        .with_state(state)
        .layer(cors)
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Snapshot as consumed by the frontend (camelCase contract).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotJson {
    identity: String,
    score: u64,
    level: u64,
    total_earned: u64,
    total_spent: u64,
    /// ISO-8601, or null until the first ledger entry.
    last_updated: Option<String>,
    achievements: Vec<String>,
    /// Raw deltas in insertion order. Display-only.
    transaction_history: Vec<i64>,
}

impl From<ReputationSnapshot> for SnapshotJson {
    fn from(snap: ReputationSnapshot) -> Self {
        Self {
            identity: snap.identity.to_string(),
            score: snap.score,
            level: snap.level,
            total_earned: snap.total_earned,
            total_spent: snap.total_spent,
            last_updated: snap.last_updated.map(|t| t.to_rfc3339()),
            achievements: snap.achievements.into_iter().collect(),
            transaction_history: snap.history,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutateRequest {
    user_id: String,
    amount: u64,
    reason: String,
}

#[derive(Debug, Deserialize)]
struct LeaderboardQuery {
    limit: Option<usize>,
}

/// Map an engine error to an HTTP response.
fn error_response(err: MeritError) -> (StatusCode, Json<serde_json::Value>) {
    let status = error_status(&err);
    if status.is_server_error() {
        error!(%err, "reputation api failure");
    }
    (status, Json(json!({ "error": err.to_string() })))
}

fn error_status(err: &MeritError) -> StatusCode {
    if err.is_business() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — liveness probe.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": state.started.elapsed().as_secs(),
    }))
}

/// `GET /api/reputation/:user_id` — current snapshot for an identity.
async fn api_snapshot(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    match state.service.snapshot(&IdentityId::from(user_id)) {
        Ok(snap) => Json(SnapshotJson::from(snap)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// `GET /api/reputation/leaderboard?limit=N` — top identities by score.
async fn api_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Response {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
        .min(MAX_LEADERBOARD_LIMIT);
    match state.service.leaderboard(limit) {
        Ok(board) => {
            let board: Vec<SnapshotJson> = board.into_iter().map(SnapshotJson::from).collect();
            Json(board).into_response()
        }
        Err(err) => error_response(err).into_response(),
    }
}

/// `POST /api/reputation/award` — award points to an identity.
async fn api_award(
    State(state): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Response {
    let identity = IdentityId::from(req.user_id);
    match state.service.award(&identity, req.amount, &req.reason) {
        Ok(snap) => Json(SnapshotJson::from(snap)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// `POST /api/reputation/deduct` — deduct points from an identity.
async fn api_deduct(
    State(state): State<AppState>,
    Json(req): Json<MutateRequest>,
) -> Response {
    let identity = IdentityId::from(req.user_id);
    match state.service.deduct(&identity, req.amount, &req.reason) {
        Ok(snap) => Json(SnapshotJson::from(snap)).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}
