//! Sift Core Library
//!
//! Shared functionality for the Sift expense categorizer:
//! - CSV ledger import
//! - Keyword rules and model-backed transaction classification
//! - Pluggable model backends (Ollama, disabled, mock)
//! - Prompt library for customizable prompts
//! - Robust anomaly labelling and monthly trends
//! - CSV and JSON export

pub mod ai;
pub mod anomaly;
pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod rules;
pub mod stats;
pub mod trends;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    AIBackend, AIClient, CategoryReply, DisabledBackend, MockBackend, MockReply, OllamaBackend,
    ReplyError,
};
pub use anomaly::detect_anomalies;
pub use classify::{Classifier, ClassifyStats, ModelClassifier};
pub use config::{AiConfig, AnomalyConfig, BackendKind, Config};
pub use error::{Error, Result};
pub use export::{ExportFormat, JsonReport};
pub use import::{parse_ledger, parse_ledger_file, ImportResult, InvalidRow};
pub use models::{
    AnomalyLabel, AnomalyRecord, CategorySet, ClassificationMethod, ClassificationResult,
    ClassifiedTransaction, Transaction,
};
pub use pipeline::{Pipeline, PipelineOutput};
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use rules::{MerchantRule, RuleTable};
pub use trends::{CategoryPivot, CategorySummary, MonthlyTotal};
