//! Pluggable model backend abstraction
//!
//! The classifier needs exactly one capability from a model: answer a prompt
//! with a JSON value. Everything else (prompt building, schema checks,
//! fallbacks) lives in [`crate::classify`].
//!
//! # Architecture
//!
//! - `AIBackend` trait: the interface every backend implements
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `DisabledBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::load(None)?;
//! let ai = AIClient::from_config(&config.ai)?;
//! let value = ai.classify_json(&prompt).await?;
//! ```

mod disabled;
mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use disabled::DisabledBackend;
pub use mock::{MockBackend, MockReply};
pub use ollama::OllamaBackend;
pub use types::*;

#[cfg(any(test, feature = "test-utils"))]
pub(crate) use mock::{description_from_prompt, guess_category};

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{AiConfig, BackendKind};
use crate::error::Result;

/// Trait defining the interface for all model backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one prompt and return the reply parsed as JSON
    ///
    /// Transport failures, timeouts, error statuses and replies with no
    /// parseable JSON are all errors. Shape is not checked here.
    async fn classify_json(&self, prompt: &str) -> Result<Value>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Model classification turned off
    Disabled(DisabledBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create a client for the configured backend
    pub fn from_config(config: &AiConfig) -> Result<Self> {
        match config.backend {
            BackendKind::Ollama => Ok(AIClient::Ollama(OllamaBackend::new(
                &config.host,
                &config.model,
                config.timeout,
                config.temperature,
            )?)),
            BackendKind::Disabled => Ok(AIClient::disabled()),
            BackendKind::Mock => Ok(AIClient::mock()),
        }
    }

    /// Create a disabled backend
    pub fn disabled() -> Self {
        AIClient::Disabled(DisabledBackend::new())
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }

    /// Whether this client talks to a real model
    pub fn is_disabled(&self) -> bool {
        matches!(self, AIClient::Disabled(_))
    }

    /// Create a new instance with a different model
    ///
    /// Used for runtime model override (`--model`)
    pub fn with_model(&self, model: &str) -> Self {
        match self {
            AIClient::Ollama(b) => AIClient::Ollama(b.with_model(model)),
            other => other.clone(),
        }
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn classify_json(&self, prompt: &str) -> Result<Value> {
        match self {
            AIClient::Ollama(b) => b.classify_json(prompt).await,
            AIClient::Disabled(b) => b.classify_json(prompt).await,
            AIClient::Mock(b) => b.classify_json(prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::Ollama(b) => b.health_check().await,
            AIClient::Disabled(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.model(),
            AIClient::Disabled(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::Ollama(b) => b.host(),
            AIClient::Disabled(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
