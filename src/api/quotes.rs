use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use serde::Deserialize;

use crate::models::{NewQuote, Quote, QuoteUpdate};

use super::error::IntoApiErrorOption;
use super::{AdminGuard, ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active: bool,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Quote>>> {
    let quotes = if query.active {
        state.repo.list_active_quotes().await?
    } else {
        state.repo.list_quotes().await?
    };
    Ok(Json(quotes))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Quote>> {
    let quote = state.repo.get_quote(id).await?.ok_or_not_found("Quote")?;
    Ok(Json(quote))
}

pub async fn create(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewQuote>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    if new.text.trim().is_empty() || new.author.trim().is_empty() {
        return Err(ApiError::bad_request("Text and author are required"));
    }
    let created = state.repo.insert_quote(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<QuoteUpdate>,
) -> ApiResult<Json<Quote>> {
    let updated = state
        .repo
        .update_quote(id, update)
        .await?
        .ok_or_not_found("Quote")?;
    Ok(Json(updated))
}

pub async fn remove(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_quote(id).await? {
        return Err(ApiError::not_found("Quote not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
