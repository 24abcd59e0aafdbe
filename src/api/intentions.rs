use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::models::{Intention, IntentionUpdate, NewIntention, ReorderItem};

use super::error::IntoApiErrorOption;
use super::{AdminGuard, ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub intentions: Vec<ReorderItem>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Intention>>> {
    let intentions = if query.active {
        state.repo.list_active_intentions().await?
    } else {
        state.repo.list_intentions().await?
    };
    Ok(Json(intentions))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Intention>> {
    let intention = state.repo.get_intention(id).await?.ok_or_not_found("Intention")?;
    Ok(Json(intention))
}

pub async fn create(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(mut new): Json<NewIntention>,
) -> ApiResult<(StatusCode, Json<Intention>)> {
    new.text = new.text.trim().to_string();
    if new.text.is_empty() {
        return Err(ApiError::bad_request("Text is required"));
    }
    let created = state.repo.insert_intention(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<IntentionUpdate>,
) -> ApiResult<Json<Intention>> {
    if update.text.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::bad_request("Text cannot be empty"));
    }
    let updated = state
        .repo
        .update_intention(id, update)
        .await?
        .ok_or_not_found("Intention")?;
    Ok(Json(updated))
}

pub async fn reorder(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Intention>>> {
    state.repo.reorder_intentions(request.intentions).await?;
    Ok(Json(state.repo.list_intentions().await?))
}

pub async fn remove(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_intention(id).await? {
        return Err(ApiError::not_found("Intention not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
