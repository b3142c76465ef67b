//! Model reply types
//!
//! These types are backend-agnostic and used across all AI implementations.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::MAX_REASON_CHARS;

/// Why a model reply was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplyError {
    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("reply does not match schema: {0}")]
    Malformed(String),

    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),

    #[error("reason is {0} chars, limit is {MAX_REASON_CHARS}")]
    ReasonTooLong(usize),
}

/// A schema-valid category reply from the model
///
/// The category is not checked against the allowed set here; that is the
/// caller's job since the set varies per run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryReply {
    pub category: String,
    pub confidence: f64,
    pub reason: String,
}

impl CategoryReply {
    /// Validate a parsed reply
    ///
    /// Extra keys are ignored. `confidence` must be a JSON number (integers
    /// are fine) within [0, 1].
    pub fn from_value(value: Value) -> Result<Self, ReplyError> {
        if !value.is_object() {
            return Err(ReplyError::NotAnObject);
        }

        let reply: CategoryReply =
            serde_json::from_value(value).map_err(|e| ReplyError::Malformed(e.to_string()))?;

        if !reply.confidence.is_finite() || !(0.0..=1.0).contains(&reply.confidence) {
            return Err(ReplyError::ConfidenceOutOfRange(reply.confidence));
        }

        let reason_chars = reply.reason.chars().count();
        if reason_chars > MAX_REASON_CHARS {
            return Err(ReplyError::ReasonTooLong(reason_chars));
        }

        Ok(reply)
    }
}
