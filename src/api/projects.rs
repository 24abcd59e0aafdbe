use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::db::FeaturedTable;
use crate::models::{NewProject, Project, ProjectUpdate};

use super::articles::validate_slug;
use super::error::IntoApiErrorOption;
use super::{AdminGuard, ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub featured: bool,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state
        .repo
        .list_projects()
        .await?
        .into_iter()
        .filter(|p| !query.featured || p.featured)
        .collect();
    Ok(Json(projects))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Project>> {
    let project = state.repo.get_project(&key).await?.ok_or_not_found("Project")?;
    Ok(Json(project))
}

pub async fn create(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    validate_slug(&new.slug)?;
    if new.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    let created = state.repo.insert_project(new).await?;
    tracing::info!(slug = %created.slug, "Project created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    if let Some(slug) = &update.slug {
        validate_slug(slug)?;
    }
    let updated = state
        .repo
        .update_project(&key, update)
        .await?
        .ok_or_not_found("Project")?;
    Ok(Json(updated))
}

pub async fn remove(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_project(&key).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn feature(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Project>> {
    let project = state.repo.get_project(&key).await?.ok_or_not_found("Project")?;
    if !state.repo.set_featured(FeaturedTable::Projects, project.id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    Ok(Json(Project {
        featured: true,
        ..project
    }))
}
