use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Local;
use serde_json::{json, Value};

use crate::rotation::Today;

use super::{ApiResult, AppState};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Today's contemplation and intention, and this hour's quote.
pub async fn today(State(state): State<Arc<AppState>>) -> ApiResult<Json<Today>> {
    let contemplations = state.repo.list_active_contemplations().await?;
    let intentions = state.repo.list_active_intentions().await?;
    let quotes = state.repo.list_active_quotes().await?;

    Ok(Json(Today::select(
        &Local::now(),
        &contemplations,
        &intentions,
        &quotes,
        state.rotation_offset,
    )))
}
