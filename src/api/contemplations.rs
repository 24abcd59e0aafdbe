use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::FeaturedTable;
use crate::models::{
    Answer, AnswerFilter, Contemplation, ContemplationUpdate, NewContemplation, ReorderItem,
};

use super::error::IntoApiErrorOption;
use super::{AdminGuard, ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub answers: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub contemplations: Vec<ReorderItem>,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub id: i64,
    pub votes: i64,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Contemplation>>> {
    let mut contemplations = if query.active {
        state.repo.list_active_contemplations().await?
    } else {
        state.repo.list_contemplations().await?
    };

    if query.answers {
        let mut by_question = group_by_contemplation(
            state.repo.list_answers(AnswerFilter::Approved).await?,
        );
        for contemplation in &mut contemplations {
            contemplation.answers = Some(by_question.remove(&contemplation.id).unwrap_or_default());
        }
    }

    Ok(Json(contemplations))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Contemplation>> {
    let mut contemplation = state
        .repo
        .get_contemplation(id)
        .await?
        .ok_or_not_found("Contemplation")?;
    let answers = state.repo.list_answers(AnswerFilter::Approved).await?;
    contemplation.answers = Some(
        answers
            .into_iter()
            .filter(|a| a.contemplation_id == Some(id))
            .collect(),
    );
    Ok(Json(contemplation))
}

pub async fn create(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(mut new): Json<NewContemplation>,
) -> ApiResult<(StatusCode, Json<Contemplation>)> {
    new.question = new.question.trim().to_string();
    if new.question.is_empty() {
        return Err(ApiError::bad_request("Question is required"));
    }
    let created = state.repo.insert_contemplation(new).await?;
    tracing::info!(id = created.id, "Contemplation created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<ContemplationUpdate>,
) -> ApiResult<Json<Contemplation>> {
    if update.question.as_deref().is_some_and(|q| q.trim().is_empty()) {
        return Err(ApiError::bad_request("Question cannot be empty"));
    }
    let updated = state
        .repo
        .update_contemplation(id, update)
        .await?
        .ok_or_not_found("Contemplation")?;
    Ok(Json(updated))
}

pub async fn reorder(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> ApiResult<Json<Vec<Contemplation>>> {
    state.repo.reorder_contemplations(request.contemplations).await?;
    Ok(Json(state.repo.list_contemplations().await?))
}

/// Answers are kept and unlinked.
pub async fn remove(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_contemplation(id).await? {
        return Err(ApiError::not_found("Contemplation not found"));
    }
    tracing::info!(id, "Contemplation deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn feature(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Contemplation>> {
    if !state.repo.set_featured(FeaturedTable::Contemplations, id).await? {
        return Err(ApiError::not_found("Contemplation not found"));
    }
    let featured = state
        .repo
        .get_contemplation(id)
        .await?
        .ok_or_not_found("Contemplation")?;
    Ok(Json(featured))
}

pub async fn vote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<VoteResponse>> {
    let votes = state
        .repo
        .increment_votes(id)
        .await?
        .ok_or_not_found("Contemplation")?;
    Ok(Json(VoteResponse { id, votes }))
}

fn group_by_contemplation(answers: Vec<Answer>) -> HashMap<i64, Vec<Answer>> {
    let mut grouped: HashMap<i64, Vec<Answer>> = HashMap::new();
    for answer in answers {
        if let Some(id) = answer.contemplation_id {
            grouped.entry(id).or_default().push(answer);
        }
    }
    grouped
}
