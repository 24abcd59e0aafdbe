use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;

use crate::db::FeaturedTable;
use crate::models::{Article, ArticleUpdate, NewArticle};

use super::error::IntoApiErrorOption;
use super::{AdminGuard, ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub featured: bool,
    pub tag: Option<String>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Article>>> {
    let articles = state
        .repo
        .list_articles()
        .await?
        .into_iter()
        .filter(|a| !query.featured || a.featured)
        .filter(|a| match &query.tag {
            Some(tag) => a.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)),
            None => true,
        })
        .collect();
    Ok(Json(articles))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Article>> {
    let article = state.repo.get_article(&key).await?.ok_or_not_found("Article")?;
    Ok(Json(article))
}

pub async fn html(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Html<String>> {
    let article = state.repo.get_article(&key).await?.ok_or_not_found("Article")?;
    Ok(Html(state.renderer.render(&article.content)))
}

pub async fn create(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewArticle>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    validate_slug(&new.slug)?;
    if new.title.trim().is_empty() {
        return Err(ApiError::bad_request("Title is required"));
    }
    let created = state.repo.insert_article(new).await?;
    tracing::info!(slug = %created.slug, "Article created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(update): Json<ArticleUpdate>,
) -> ApiResult<Json<Article>> {
    if let Some(slug) = &update.slug {
        validate_slug(slug)?;
    }
    let updated = state
        .repo
        .update_article(&key, update)
        .await?
        .ok_or_not_found("Article")?;
    Ok(Json(updated))
}

pub async fn remove(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_article(&key).await? {
        return Err(ApiError::not_found("Article not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn feature(
    _admin: AdminGuard,
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Article>> {
    let article = state.repo.get_article(&key).await?.ok_or_not_found("Article")?;
    if !state.repo.set_featured(FeaturedTable::Articles, article.id).await? {
        return Err(ApiError::not_found("Article not found"));
    }
    Ok(Json(Article {
        featured: true,
        ..article
    }))
}

/// Slugs are path segments: lowercase letters, digits and dashes.
pub(super) fn validate_slug(slug: &str) -> ApiResult<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!("Invalid slug: {slug:?}")))
    }
}
