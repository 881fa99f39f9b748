//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers); tighten for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/question", get(http::http_get_question))
        .route("/api/v1/evaluate/grammar", post(http::http_post_evaluate_grammar))
        .route("/api/v1/evaluate/reading", post(http::http_post_evaluate_reading))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::FallbackCatalog;
    use crate::config::Prompts;

    fn app() -> Router {
        let state = AppState::with_parts(None, FallbackCatalog::embedded(), Prompts::default(), Duration::from_secs(1));
        build_router(Arc::new(state))
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = app().oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn question_defaults_and_normalization() {
        let res = app().oneshot(Request::get("/api/v1/question").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v = body_json(res).await;
        assert_eq!(v["type"], "multiple-choice");
        assert_eq!(v["subject"], "Math");
        assert_eq!(v["difficulty"], "Easy");
        assert_eq!(v["sub_activity"], "Addition/Subtraction");
        assert_eq!(v["choices"].as_array().unwrap().len(), 4);

        let uri = "/api/v1/question?grade=42&subject=english&sub_activity=Grammar%20Correction&difficulty=hard&question_type=multiple-choice";
        let res = app().oneshot(Request::get(uri).body(Body::empty()).unwrap()).await.unwrap();
        let v = body_json(res).await;
        assert_eq!(v["type"], "direct-answer");
        assert_eq!(v["subject"], "English");
        assert_eq!(v["difficulty"], "Hard");
        assert!(v.get("choices").is_none());
    }

    #[tokio::test]
    async fn evaluate_endpoints_fall_back_without_a_model() {
        let req = Request::post("/api/v1/evaluate/reading")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"passage": "Sara has a brown dog.", "question": "What color?", "user_answer": "brown", "correct_answer": "Brown"})
                    .to_string(),
            ))
            .unwrap();
        let v = body_json(app().oneshot(req).await.unwrap()).await;
        assert_eq!(v["is_correct"], true);

        let req = Request::post("/api/v1/evaluate/grammar")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"question": "He go.", "user_answer": "go", "correct_answer": "He goes.", "player_name": "Aria"}).to_string(),
            ))
            .unwrap();
        let v = body_json(app().oneshot(req).await.unwrap()).await;
        assert_eq!(v["is_correct"], false);
        assert!(v["feedback"].as_str().unwrap().contains("Aria"));
    }
}
