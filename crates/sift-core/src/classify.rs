//! Transaction classification
//!
//! Each transaction goes through a short priority chain:
//! 1. Keyword rules (first match in table order)
//! 2. The model backend, whose reply is strictly validated
//! 3. "Other" with a low confidence when anything goes wrong
//!
//! Every result names a category from the run's [`CategorySet`]. Failures in
//! step 2 are logged and turned into fallback results; they never propagate.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::ai::{AIBackend, AIClient, CategoryReply};
use crate::error::Result;
use crate::models::{CategorySet, ClassificationMethod, ClassificationResult, Transaction};
use crate::normalize::{normalize_for_match, normalize_text};
use crate::prompts::{Prompt, PromptId, PromptLibrary};
use crate::rules::RuleTable;

/// Confidence when a rule names a category that is not in the set
pub const UNKNOWN_RULE_CATEGORY_CONFIDENCE: f64 = 0.4;
/// Confidence when the model call or its reply is unusable
pub const MODEL_FAILURE_CONFIDENCE: f64 = 0.2;
/// Cap on confidence when the model names a category outside the set
pub const DISALLOWED_CATEGORY_MAX_CONFIDENCE: f64 = 0.4;

pub const REASON_RULE_UNKNOWN_CATEGORY: &str = "Rule mapped to unknown category; forced Other";
pub const REASON_CALL_FAILED: &str = "LLM call failed; defaulted to Other";
pub const REASON_INVALID_OUTPUT: &str = "Invalid LLM output; defaulted to Other";
pub const REASON_CATEGORY_NOT_ALLOWED: &str = "Category not allowed; defaulted to Other";

/// Progress callback for batch classification
/// Parameters: (current, total)
pub type ClassifyProgressCallback = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Asks the model backend for a category and validates the answer
#[derive(Clone)]
pub struct ModelClassifier {
    ai: AIClient,
    prompt: Prompt,
}

impl ModelClassifier {
    /// Create a classifier using the default prompt library (with overrides)
    pub fn new(ai: AIClient) -> Result<Self> {
        Self::with_prompts(ai, &PromptLibrary::new())
    }

    /// Create a classifier loading its prompt from `prompts`
    pub fn with_prompts(ai: AIClient, prompts: &PromptLibrary) -> Result<Self> {
        let prompt = prompts.get(PromptId::ClassifyTransaction)?;
        if prompt.is_override {
            debug!(
                path = ?prompt.override_path,
                "Using prompt override for classify_transaction"
            );
        }
        Ok(Self { ai, prompt })
    }

    pub fn ai(&self) -> &AIClient {
        &self.ai
    }

    /// Render the classification prompt for one description
    pub fn build_prompt(&self, description: &str, categories: &CategorySet) -> String {
        let joined = categories.joined();
        let mut vars = HashMap::new();
        vars.insert("categories", joined.as_str());
        vars.insert("description", description);
        self.prompt.render(&vars)
    }

    /// Classify one description with a single model call
    ///
    /// Never fails: call errors, schema violations and disallowed categories
    /// all map to an "Other" fallback.
    pub async fn classify(&self, description: &str, categories: &CategorySet) -> ClassificationResult {
        let prompt = self.build_prompt(description, categories);

        let value = match self.ai.classify_json(&prompt).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Model call failed for '{}': {}", description, e);
                return ClassificationResult::fallback(MODEL_FAILURE_CONFIDENCE, REASON_CALL_FAILED);
            }
        };
        debug!("Model reply for '{}': {}", description, value);

        let reply = match CategoryReply::from_value(value) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Invalid model reply for '{}': {}", description, e);
                return ClassificationResult::fallback(
                    MODEL_FAILURE_CONFIDENCE,
                    REASON_INVALID_OUTPUT,
                );
            }
        };

        if !categories.contains(&reply.category) {
            warn!(
                "Model picked unknown category '{}' for '{}'",
                reply.category, description
            );
            return ClassificationResult::fallback(
                reply.confidence.min(DISALLOWED_CATEGORY_MAX_CONFIDENCE),
                REASON_CATEGORY_NOT_ALLOWED,
            );
        }

        ClassificationResult::new(
            reply.category,
            reply.confidence,
            &reply.reason,
            ClassificationMethod::Llm,
        )
    }
}

/// Per-method counts from a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyStats {
    pub processed: usize,
    pub by_rule: usize,
    pub by_llm: usize,
    pub fallback: usize,
}

impl ClassifyStats {
    fn record(&mut self, method: ClassificationMethod) {
        self.processed += 1;
        match method {
            ClassificationMethod::Rule => self.by_rule += 1,
            ClassificationMethod::Llm => self.by_llm += 1,
            ClassificationMethod::Fallback => self.fallback += 1,
        }
    }
}

/// Rules first, then the model
pub struct Classifier {
    categories: CategorySet,
    rules: RuleTable,
    model: ModelClassifier,
    progress: Option<ClassifyProgressCallback>,
}

impl Classifier {
    pub fn new(categories: CategorySet, rules: RuleTable, model: ModelClassifier) -> Self {
        Self {
            categories,
            rules,
            model,
            progress: None,
        }
    }

    /// Report (current, total) after each transaction of a batch
    pub fn with_progress(mut self, callback: ClassifyProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Classify a single description
    pub async fn classify_one(&self, description: &str) -> ClassificationResult {
        let description = normalize_text(description);
        let normalized = normalize_for_match(&description);

        if let Some(hit) = self.rules.find_match(&normalized) {
            if !self.categories.contains(hit.category) {
                warn!(
                    "Rule '{}' maps to '{}', which is not a known category",
                    hit.keyword, hit.category
                );
                return ClassificationResult::fallback(
                    UNKNOWN_RULE_CATEGORY_CONFIDENCE,
                    REASON_RULE_UNKNOWN_CATEGORY,
                );
            }
            debug!("Rule match '{}' for '{}'", hit.keyword, description);
            return ClassificationResult::new(
                hit.category,
                hit.confidence,
                &hit.reason,
                ClassificationMethod::Rule,
            );
        }

        self.model.classify(&description, &self.categories).await
    }

    /// Classify a batch in order, one model call at a time
    pub async fn classify_batch(
        &self,
        transactions: &[Transaction],
    ) -> (Vec<ClassificationResult>, ClassifyStats) {
        let total = transactions.len();
        let mut stats = ClassifyStats::default();
        let mut results = Vec::with_capacity(total);

        for (i, tx) in transactions.iter().enumerate() {
            let result = self.classify_one(&tx.description).await;
            stats.record(result.method);
            results.push(result);

            if let Some(ref progress) = self.progress {
                progress(i + 1, total);
            }
        }

        info!(
            processed = stats.processed,
            by_rule = stats.by_rule,
            by_llm = stats.by_llm,
            fallback = stats.fallback,
            "Classification complete"
        );

        (results, stats)
    }
}
