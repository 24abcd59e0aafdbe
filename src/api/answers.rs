use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

use crate::answers::{submit_answer, AnswerSubmission, Placement, SubmittedAnswer};
use crate::models::{Answer, AnswerFilter, AnswerUpdate};

use super::error::IntoApiErrorOption;
use super::{AdminGuard, ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// `true` for the moderation queue, `all` for everything.
    pub pending: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<AnswerFilter, ApiError> {
        match self.pending.as_deref() {
            None | Some("false") => Ok(AnswerFilter::Approved),
            Some("true") => Ok(AnswerFilter::Pending),
            Some("all") => Ok(AnswerFilter::All),
            Some(other) => Err(ApiError::bad_request(format!(
                "pending must be true, false or all, got {other}"
            ))),
        }
    }
}

/// The public board sees approved notes; the queue needs the admin password.
pub async fn list(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Answer>>> {
    let filter = query.filter()?;
    if filter != AnswerFilter::Approved {
        state.authorize(&headers)?;
    }
    Ok(Json(state.repo.list_answers(filter).await?))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> ApiResult<Json<Answer>> {
    let answer = state.repo.get_answer(id).await?.ok_or_not_found("Answer")?;
    if !answer.approved {
        // Unreviewed notes stay invisible to the public.
        state
            .authorize(&headers)
            .map_err(|_| ApiError::not_found("Answer not found"))?;
    }
    Ok(Json(answer))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<AnswerSubmission>,
) -> ApiResult<(StatusCode, Json<SubmittedAnswer>)> {
    let placement = Placement::random(&mut rand::rng());
    let submitted = submit_answer(&state.repo, submission, placement).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

pub async fn update(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<AnswerUpdate>,
) -> ApiResult<Json<Answer>> {
    if update.answer.as_deref().is_some_and(|a| a.trim().is_empty())
        || update.author.as_deref().is_some_and(|a| a.trim().is_empty())
    {
        return Err(ApiError::bad_request("Answer and author cannot be empty"));
    }
    let updated = state
        .repo
        .update_answer(id, update)
        .await?
        .ok_or_not_found("Answer")?;
    tracing::info!(id, approved = updated.approved, "Answer moderated");
    Ok(Json(updated))
}

pub async fn remove(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_answer(id).await? {
        return Err(ApiError::not_found("Answer not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}
