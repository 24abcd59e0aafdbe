// tests/api.rs

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use lyceum::answers::{PENDING_MESSAGE, ROTATION_RANGE, X_RANGE, Y_RANGE};
use lyceum::api::{router, AppState, ADMIN_HEADER};
use lyceum::db::{FeaturedTable, Repository};
use lyceum::markdown::MarkdownRenderer;
use lyceum::models::{Answer, AnswerFilter, Contemplation, NewContemplation};
use lyceum::sync::ContentClient;

const PASSWORD: &str = "hemlock";

async fn test_app() -> (Router, Repository) {
    let repo = Repository::open_in_memory().await.unwrap();
    let state = AppState {
        repo: repo.clone(),
        renderer: MarkdownRenderer::new().unwrap(),
        admin_password: Some(PASSWORD.to_string()),
        rotation_offset: 0,
    };
    (router(Arc::new(state)), repo)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>, admin: bool) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if admin {
        builder = builder.header(ADMIN_HEADER, PASSWORD);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_string(&value).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

async fn seed_contemplation(repo: &Repository, question: &str) -> Contemplation {
    repo.insert_contemplation(NewContemplation {
        question: question.to_string(),
        active: None,
        featured: None,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/health", None, false).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
}

#[tokio::test]
async fn submitted_answers_wait_for_review() {
    let (app, repo) = test_app().await;
    let contemplation = seed_contemplation(&repo, "What is courage?").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/answers",
        Some(json!({
            "answer": "  Acting well despite fear.  ",
            "author": "Laches",
            "contemplationId": contemplation.id,
        })),
        false,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["message"], PENDING_MESSAGE);

    let answer: Answer = serde_json::from_value(value["answer"].clone()).unwrap();
    assert!(!answer.approved);
    assert_eq!(answer.answer, "Acting well despite fear.");
    assert_eq!(answer.question, "What is courage?");
    assert_eq!(answer.contemplation_id, Some(contemplation.id));
    assert!(X_RANGE.contains(&answer.position.x));
    assert!(Y_RANGE.contains(&answer.position.y));
    assert!(ROTATION_RANGE.contains(&answer.rotation));

    // Not on the public board until approved
    let (_, body) = send(&app, "GET", "/api/answers", None, false).await;
    let public: Vec<Answer> = serde_json::from_slice(&body).unwrap();
    assert!(public.is_empty());

    let (status, _) = send(&app, "GET", &format!("/api/answers/{}", answer.id), None, false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_author_is_rejected_and_nothing_is_stored() {
    let (app, repo) = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/answers",
        Some(json!({ "answer": "To know that I know nothing.", "author": "   " })),
        false,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["error"], true);
    assert!(repo.list_answers(AnswerFilter::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn moderation_approves_a_note() {
    let (app, _) = test_app().await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/answers",
        Some(json!({ "answer": "Wonder.", "author": "Theaetetus", "question": "Where does philosophy begin?" })),
        false,
    )
    .await;
    let value: Value = serde_json::from_slice(&body).unwrap();
    let id = value["answer"]["id"].as_i64().unwrap();

    let (status, _) = send(&app, "GET", "/api/answers?pending=true", None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(&app, "GET", "/api/answers?pending=true", None, true).await;
    let pending: Vec<Answer> = serde_json::from_slice(&body).unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].question, "Where does philosophy begin?");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/answers/{id}"),
        Some(json!({ "approved": true })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/api/answers", None, false).await;
    let public: Vec<Answer> = serde_json::from_slice(&body).unwrap();
    assert_eq!(public.len(), 1);
    assert!(public[0].approved);
}

#[tokio::test]
async fn admin_routes_require_the_password() {
    let (app, repo) = test_app().await;
    let contemplation = seed_contemplation(&repo, "What is justice?").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/contemplations",
        Some(json!({ "question": "What is piety?" })),
        false,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["error_code"], "UNAUTHORIZED");

    let uri = format!("/api/contemplations/{}", contemplation.id);
    let (status, _) = send(&app, "DELETE", &uri, None, false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(repo.get_contemplation(contemplation.id).await.unwrap().is_some());

    let (status, _) = send(&app, "POST", "/api/quotes", Some(json!({ "text": "x", "author": "y" })), false).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_a_contemplation_keeps_its_answers() {
    let (app, repo) = test_app().await;
    let contemplation = seed_contemplation(&repo, "Is the unexamined life worth living?").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/answers",
        Some(json!({ "answer": "No.", "author": "Socrates", "contemplationId": contemplation.id })),
        false,
    )
    .await;
    let value: Value = serde_json::from_slice(&body).unwrap();
    let answer_id = value["answer"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/contemplations/{}", contemplation.id),
        None,
        true,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, "GET", &format!("/api/answers/{answer_id}"), None, true).await;
    let answer: Answer = serde_json::from_slice(&body).unwrap();
    assert_eq!(answer.contemplation_id, None);
    assert_eq!(answer.question, "Is the unexamined life worth living?");

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/contemplations/{}", contemplation.id),
        None,
        true,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn featured_contemplation_wins_the_day() {
    let (app, repo) = test_app().await;
    seed_contemplation(&repo, "What is virtue?").await;
    let second = seed_contemplation(&repo, "Can virtue be taught?").await;
    seed_contemplation(&repo, "What is knowledge?").await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/contemplations/{}/feature", second.id),
        None,
        true,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let featured: Contemplation = serde_json::from_slice(&body).unwrap();
    assert!(featured.featured);

    let (status, body) = send(&app, "GET", "/api/today", None, false).await;
    assert_eq!(status, StatusCode::OK);
    let today: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(today["contemplation"]["id"], second.id);
    assert!(today["intention"]["text"].is_string());
    assert!(today["quote"]["author"].is_string());

    // Featuring is exclusive
    let all = repo.list_contemplations().await.unwrap();
    assert_eq!(all.iter().filter(|c| c.featured).count(), 1);
}

#[tokio::test]
async fn empty_store_falls_back_to_builtins() {
    let (app, _) = test_app().await;

    let (status, body) = send(&app, "GET", "/api/today", None, false).await;

    assert_eq!(status, StatusCode::OK);
    let today: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(today["contemplation"]["id"], 0);
    assert!(!today["contemplation"]["question"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn votes_accumulate_on_the_server() {
    let (app, repo) = test_app().await;
    let contemplation = seed_contemplation(&repo, "What is love?").await;
    let uri = format!("/api/contemplations/{}/vote", contemplation.id);

    send(&app, "POST", &uri, None, false).await;
    let (status, body) = send(&app, "POST", &uri, None, false).await;

    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["votes"], 2);

    let (status, _) = send(&app, "POST", "/api/contemplations/999/vote", None, false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn articles_are_served_by_slug_and_rendered() {
    let (app, _) = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/articles",
        Some(json!({
            "slug": "the-cave",
            "title": "The Cave",
            "excerpt": "Shadows and light.",
            "date": "2025-03-01",
            "readTime": "4 min",
            "tags": ["Plato", "epistemology"],
            "content": "# The Cave\n\nShadows on the wall."
        })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", "/api/articles/the-cave", None, false).await;
    assert_eq!(status, StatusCode::OK);
    let article: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(article["title"], "The Cave");
    assert_eq!(article["content"]["format"], "markdown");

    let (status, body) = send(&app, "GET", "/api/articles/the-cave/html", None, false).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert_eq!(html, "<h1>The Cave</h1>\n<p>Shadows on the wall.</p>\n");

    let (_, body) = send(&app, "GET", "/api/articles?tag=plato", None, false).await;
    let tagged: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(tagged.len(), 1);

    let (_, body) = send(&app, "GET", "/api/articles?featured=true", None, false).await;
    let featured: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert!(featured.is_empty());

    let (status, _) = send(&app, "GET", "/api/articles/missing", None, false).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_slugs_are_rejected() {
    let (app, _) = test_app().await;
    let project = json!({
        "slug": "agora",
        "title": "Agora",
        "description": "A forum.",
        "tech": ["Rust"],
        "year": 2024,
        "status": "Active"
    });

    let (status, _) = send(&app, "POST", "/api/projects", Some(project.clone()), true).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&app, "POST", "/api/projects", Some(project), true).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/projects",
        Some(json!({ "slug": "Not A Slug", "title": "x", "description": "", "year": 2024, "status": "Active" })),
        true,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn client_reads_today_from_a_running_server() {
    let (app, repo) = test_app().await;
    seed_contemplation(&repo, "What is the good?").await;
    let featured = seed_contemplation(&repo, "What is the beautiful?").await;
    repo.set_featured(FeaturedTable::Contemplations, featured.id)
        .await
        .unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let client = ContentClient::new(&format!("http://{addr}")).unwrap();
    let today = client.today().await.unwrap();

    assert_eq!(today.contemplation.id, featured.id);
    assert_eq!(today.contemplation.question, "What is the beautiful?");
}
