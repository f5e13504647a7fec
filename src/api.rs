// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::store::{Article, ArticleStore, Subscriber, SubscriberStore};

#[derive(Clone)]
pub struct AppState {
    pub articles: Arc<dyn ArticleStore>,
    pub subscribers: Arc<dyn SubscriberStore>,
    /// Keyword set newly created subscribers start with.
    pub default_keywords: Vec<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(|| async { "ok" }))
        .route("/users", post(create_user))
        .route("/users/{email}", delete(delete_user))
        .route("/articles", get(list_articles))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "NewsDrop is running" }))
}

#[derive(serde::Deserialize)]
struct CreateUserReq {
    email: String,
    /// Optional explicit keyword set; defaults to the configured list.
    #[serde(default)]
    keywords: Option<Vec<String>>,
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserReq>,
) -> Result<(StatusCode, Json<Subscriber>), (StatusCode, String)> {
    let email = body.email.trim().to_ascii_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "invalid email".into()));
    }

    let keywords = body
        .keywords
        .filter(|kws| !kws.is_empty())
        .unwrap_or_else(|| state.default_keywords.clone());
    let sub = Subscriber { email, keywords };

    match state.subscribers.insert(sub.clone()).await {
        Ok(true) => Ok((StatusCode::CREATED, Json(sub))),
        Ok(false) => Err((StatusCode::CONFLICT, "user already exists".into())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

async fn delete_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let email = email.trim().to_ascii_lowercase();
    match state.subscribers.remove(&email).await {
        Ok(true) => Ok(Json(serde_json::json!({ "message": format!("{email} deleted") }))),
        Ok(false) => Err((StatusCode::NOT_FOUND, "user not found".into())),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

fn default_limit() -> usize {
    50
}

#[derive(serde::Deserialize)]
struct ArticlesQuery {
    #[serde(default)]
    keyword: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(q): Query<ArticlesQuery>,
) -> Result<Json<Vec<Article>>, (StatusCode, String)> {
    let rows = state
        .articles
        .recent(q.limit.min(500))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let rows = match q.keyword {
        Some(kw) => rows.into_iter().filter(|a| a.keyword == kw).collect(),
        None => rows,
    };
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use axum::body::Body;
    use http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let store = Arc::new(MemoryStore::new());
        create_router(AppState {
            articles: Arc::clone(&store) as Arc<dyn ArticleStore>,
            subscribers: store as Arc<dyn SubscriberStore>,
            default_keywords: vec!["OpenAI".into(), "SpaceX".into()],
        })
    }

    fn post_user(email: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/users")
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"email":"{email}"}}"#)))
            .unwrap()
    }

    #[tokio::test]
    async fn create_user_then_conflict() {
        let app = test_router();

        let resp = app.clone().oneshot(post_user("a@example.com")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = app.oneshot(post_user("a@example.com")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_missing_user_is_404() {
        let app = test_router();
        let req = Request::builder()
            .method("DELETE")
            .uri("/users/nobody@example.com")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let app = test_router();
        let resp = app.oneshot(post_user("not-an-email")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn articles_endpoint_returns_json_list() {
        let app = test_router();
        let req = Request::builder()
            .uri("/articles?limit=10")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
