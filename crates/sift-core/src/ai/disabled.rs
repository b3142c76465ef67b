//! Backend used when model classification is turned off

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::OTHER_CATEGORY;

use super::AIBackend;

/// Answers every prompt with a low-confidence "Other"
#[derive(Clone, Debug, Default)]
pub struct DisabledBackend;

impl DisabledBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AIBackend for DisabledBackend {
    async fn classify_json(&self, _prompt: &str) -> Result<Value> {
        Ok(json!({
            "category": OTHER_CATEGORY,
            "confidence": 0.2,
            "reason": "LLM disabled",
        }))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        "disabled"
    }

    fn host(&self) -> &str {
        "disabled://"
    }
}
