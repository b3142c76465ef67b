//! Mock backend for testing
//!
//! Provides configurable mock replies without a running model server.
//! By default it guesses a category from well-known keywords in the
//! transaction description embedded in the prompt.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};

use super::parsing::parse_json_reply;
use super::AIBackend;

/// What the mock answers with
#[derive(Clone, Debug, Default)]
pub enum MockReply {
    /// Keyword heuristic over the description in the prompt
    #[default]
    Heuristic,
    /// Always this JSON value
    Fixed(Value),
    /// Always this raw text, parsed like a real model reply
    Text(String),
    /// Every call fails
    Fail,
}

/// Mock AI backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    reply: MockReply,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::default()
        }
    }

    /// Always reply with `value`
    pub fn fixed(value: Value) -> Self {
        Self {
            reply: MockReply::Fixed(value),
            ..Self::new()
        }
    }

    /// Always reply with raw text
    pub fn text(text: &str) -> Self {
        Self {
            reply: MockReply::Text(text.to_string()),
            ..Self::new()
        }
    }

    /// Fail every call
    pub fn failing() -> Self {
        Self {
            reply: MockReply::Fail,
            ..Self::new()
        }
    }

    /// Number of classify calls made so far (shared across clones)
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Pull the description out of the classification prompt
pub(crate) fn description_from_prompt(prompt: &str) -> &str {
    const MARKER: &str = "Transaction description: \"";
    match prompt.find(MARKER) {
        Some(idx) => {
            let rest = &prompt[idx + MARKER.len()..];
            rest.split('"').next().unwrap_or(rest)
        }
        None => prompt,
    }
}

/// Keyword guess used by the mock backend and mock server
pub(crate) fn guess_category(description: &str) -> (&'static str, f64) {
    let d = description.to_uppercase();
    match d.as_str() {
        m if m.contains("SWIGGY") || m.contains("ZOMATO") || m.contains("CAFE") => ("Meals", 0.8),
        m if m.contains("UBER") || m.contains("OLA") || m.contains("IRCTC") => ("Travel", 0.8),
        m if m.contains("AIRTEL") || m.contains("JIO") || m.contains("ELECTRICITY") => {
            ("Utilities", 0.75)
        }
        m if m.contains("AWS") || m.contains("GOOGLE CLOUD") => ("Cloud & Hosting", 0.75),
        m if m.contains("SLACK") || m.contains("NOTION") => ("Software & SaaS", 0.7),
        _ => ("Other", 0.3),
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn classify_json(&self, prompt: &str) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.reply {
            MockReply::Heuristic => {
                let (category, confidence) = guess_category(description_from_prompt(prompt));
                Ok(json!({
                    "category": category,
                    "confidence": confidence,
                    "reason": "Mock keyword guess",
                }))
            }
            MockReply::Fixed(value) => Ok(value.clone()),
            MockReply::Text(text) => parse_json_reply(text),
            MockReply::Fail => Err(Error::InvalidData("Mock backend failure".into())),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
