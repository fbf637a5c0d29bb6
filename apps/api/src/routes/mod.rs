pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::interview::handlers;
use crate::interview::submission::MAX_SUBMISSION_BYTES;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:session_id",
            get(handlers::handle_get_session),
        )
        .route(
            "/api/v1/sessions/:session_id/end",
            post(handlers::handle_end_session),
        )
        .route(
            "/api/v1/sessions/:session_id/turns",
            get(handlers::handle_get_turns),
        )
        // Interview turns
        .route(
            "/api/v1/sessions/:session_id/answer",
            post(handlers::handle_submit_answer)
                .layer(DefaultBodyLimit::max(MAX_SUBMISSION_BYTES)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::CONTENT_TYPE, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::interview::engine::InterviewEngine;
    use crate::llm_client::{AiGateway, LlmError};
    use crate::store::InMemoryConversationStore;

    struct CannedGateway {
        replies: Mutex<VecDeque<&'static str>>,
    }

    #[async_trait]
    impl AiGateway for CannedGateway {
        async fn generate(&self, _directive: &str) -> Result<String, LlmError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .map(str::to_string)
                .ok_or(LlmError::EmptyContent)
        }
    }

    fn app(replies: &[&'static str]) -> Router {
        let gateway = Arc::new(CannedGateway {
            replies: Mutex::new(replies.iter().copied().collect()),
        });
        let store = Arc::new(InMemoryConversationStore::new());
        let engine = InterviewEngine::new(gateway, store, Duration::from_secs(5));
        build_router(AppState {
            engine: Arc::new(engine),
        })
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_session(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/v1/sessions",
            Some(json!({
                "name": "Asha",
                "experience": "Fresher",
                "tech_stacks": ["Go", "MongoDB"],
                "projects": [{"title": "Ledger", "description": "Bookkeeping service"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], 201);
        assert_eq!(body["data"]["interview_status"], "not-started");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(&[]), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_interview_round_trip() {
        let app = app(&[
            "<Question>What is a goroutine?</Question>",
            "<Rating>7</Rating><Feedback>Solid.</Feedback><Question>How do channels block?</Question>",
        ]);
        let id = create_session(&app).await;
        let answer_uri = format!("/api/v1/sessions/{id}/answer");

        let (status, body) = send(&app, Method::POST, &answer_uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["question"], "What is a goroutine?");
        assert_eq!(body["data"]["rating"], "");

        let (status, body) = send(
            &app,
            Method::POST,
            &answer_uri,
            Some(json!({"answer": "A lightweight thread managed by the Go runtime"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["rating"], "7");
        assert_eq!(body["data"]["question"], "How do channels block?");

        let (status, body) =
            send(&app, Method::GET, &format!("/api/v1/sessions/{id}/turns"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"]["questions"],
            json!(["What is a goroutine?", "How do channels block?"])
        );
        assert_eq!(body["data"]["ratings"], json!(["7"]));
    }

    #[tokio::test]
    async fn test_blank_answer_after_first_question() {
        let app = app(&["<Question>Q1</Question>"]);
        let id = create_session(&app).await;
        let answer_uri = format!("/api/v1/sessions/{id}/answer");

        send(&app, Method::POST, &answer_uri, Some(json!({}))).await;
        let (status, body) =
            send(&app, Method::POST, &answer_uri, Some(json!({"answer": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_ANSWER");
    }

    #[tokio::test]
    async fn test_ended_session_rejects_answers() {
        let app = app(&[]);
        let id = create_session(&app).await;

        let (status, body) =
            send(&app, Method::POST, &format!("/api/v1/sessions/{id}/end"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["interview_status"], "ended");

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/sessions/{id}/answer"),
            Some(json!({"answer": "late"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "SESSION_ENDED");
    }

    #[tokio::test]
    async fn test_malformed_session_id() {
        let (status, body) = send(
            &app(&[]),
            Method::POST,
            "/api/v1/sessions/not-a-session/answer",
            Some(json!({"answer": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_SESSION_ID");
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (status, body) = send(
            &app(&[]),
            Method::GET,
            "/api/v1/sessions/0123456789abcdef01234567",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
