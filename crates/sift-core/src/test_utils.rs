//! Test utilities for sift-core
//!
//! This module provides a mock Ollama server that can be used for
//! development and integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::ai::{description_from_prompt, guess_category};

/// How the mock server answers `/api/generate`
#[derive(Debug, Clone)]
enum Behavior {
    /// Keyword guess over the description in the prompt
    Heuristic,
    /// Always this raw `response` text
    Reply(String),
    /// Always HTTP 500
    Fail,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(Behavior::Heuristic).await
    }

    /// Start a server whose model always answers with `reply`
    pub async fn start_with_reply(reply: &str) -> Self {
        Self::start_with(Behavior::Reply(reply.to_string())).await
    }

    /// Start a server whose generate endpoint always returns 500
    pub async fn start_failing() -> Self {
        Self::start_with(Behavior::Fail).await
    }

    async fn start_with(behavior: Behavior) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(Arc::new(behavior));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.1:8b".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 4_900_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(behavior): State<Arc<Behavior>>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let response = match behavior.as_ref() {
        Behavior::Fail => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
        Behavior::Reply(text) => text.clone(),
        Behavior::Heuristic => {
            let description = description_from_prompt(&request.prompt);
            let (category, confidence) = guess_category(description);
            serde_json::json!({
                "category": category,
                "confidence": confidence,
                "reason": format!("Looks like {}", category),
            })
            .to_string()
        }
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
    .into_response()
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}
