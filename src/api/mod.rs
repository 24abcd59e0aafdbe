//! HTTP JSON API.

mod answers;
mod articles;
mod auth;
mod contemplations;
mod error;
mod intentions;
mod projects;
mod quotes;
mod today;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Repository;
use crate::error::Result;
use crate::markdown::MarkdownRenderer;

pub use auth::{AdminGuard, ADMIN_HEADER};
pub use error::{ApiError, ApiResult};

pub struct AppState {
    pub repo: Repository,
    pub renderer: MarkdownRenderer,
    pub admin_password: Option<String>,
    pub rotation_offset: u32,
}

impl AppState {
    pub fn new(repo: Repository, config: &Config) -> Result<Self> {
        Ok(Self {
            repo,
            renderer: MarkdownRenderer::new()?,
            admin_password: config.admin_password.clone(),
            rotation_offset: config.rotation_offset,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(today::health))
        .route("/api/today", get(today::today))
        // Contemplations
        .route(
            "/api/contemplations",
            get(contemplations::list)
                .post(contemplations::create)
                .put(contemplations::reorder),
        )
        .route(
            "/api/contemplations/{id}",
            get(contemplations::show)
                .put(contemplations::update)
                .delete(contemplations::remove),
        )
        .route("/api/contemplations/{id}/feature", post(contemplations::feature))
        .route("/api/contemplations/{id}/vote", post(contemplations::vote))
        // Intentions
        .route(
            "/api/intentions",
            get(intentions::list)
                .post(intentions::create)
                .put(intentions::reorder),
        )
        .route(
            "/api/intentions/{id}",
            get(intentions::show)
                .put(intentions::update)
                .delete(intentions::remove),
        )
        // Answers (sticky notes)
        .route("/api/answers", get(answers::list).post(answers::create))
        .route(
            "/api/answers/{id}",
            get(answers::show)
                .put(answers::update)
                .delete(answers::remove),
        )
        // Articles
        .route("/api/articles", get(articles::list).post(articles::create))
        .route(
            "/api/articles/{key}",
            get(articles::show)
                .put(articles::update)
                .delete(articles::remove),
        )
        .route("/api/articles/{key}/html", get(articles::html))
        .route("/api/articles/{key}/feature", post(articles::feature))
        // Quotes
        .route("/api/quotes", get(quotes::list).post(quotes::create))
        .route(
            "/api/quotes/{id}",
            get(quotes::show).put(quotes::update).delete(quotes::remove),
        )
        // Projects
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/{key}",
            get(projects::show)
                .put(projects::update)
                .delete(projects::remove),
        )
        .route("/api/projects/{key}/feature", post(projects::feature))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is interrupted.
pub async fn serve(state: Arc<AppState>, bind_address: &str) -> Result<()> {
    if state.admin_password.is_none() {
        tracing::warn!("No admin password configured; admin routes will refuse every request");
    }

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
