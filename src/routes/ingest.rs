// POST handlers: append peer, power and agent observations

use axum::{Json, extract::State, response::IntoResponse};

use super::AppState;
use super::http::ApiError;
use crate::models::{AgentRecord, PeerRecord, PowerRecord};

fn ok() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "ok" }))
}

pub(super) async fn peer_handler(
    State(state): State<AppState>,
    Json(record): Json<PeerRecord>,
) -> Result<impl IntoResponse, ApiError> {
    state.stats.repo().insert_peer(&record).await?;
    Ok(ok())
}

pub(super) async fn power_handler(
    State(state): State<AppState>,
    Json(record): Json<PowerRecord>,
) -> Result<impl IntoResponse, ApiError> {
    state.stats.repo().insert_power(&record).await?;
    Ok(ok())
}

pub(super) async fn agent_handler(
    State(state): State<AppState>,
    Json(record): Json<AgentRecord>,
) -> Result<impl IntoResponse, ApiError> {
    state.stats.repo().insert_agent(&record).await?;
    Ok(ok())
}
