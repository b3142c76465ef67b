//! End-to-end run over one batch: classify, label anomalies, summarize

use tracing::info;

use crate::ai::AIClient;
use crate::anomaly::detect_anomalies;
use crate::classify::{ClassifyProgressCallback, ClassifyStats, Classifier, ModelClassifier};
use crate::config::{AnomalyConfig, Config};
use crate::error::Result;
use crate::models::{ClassifiedTransaction, Transaction};
use crate::prompts::PromptLibrary;
use crate::trends::{
    category_summary, monthly_by_category, monthly_totals, CategoryPivot, CategorySummary,
    MonthlyTotal,
};

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// One entry per input transaction, in input order
    pub rows: Vec<ClassifiedTransaction>,
    pub stats: ClassifyStats,
    pub category_summary: Vec<CategorySummary>,
    pub monthly_totals: Vec<MonthlyTotal>,
    pub monthly_by_category: CategoryPivot,
}

impl PipelineOutput {
    pub fn total_spend(&self) -> f64 {
        self.rows.iter().map(|r| r.transaction.amount).sum()
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies().count()
    }

    /// Flagged rows in input order
    pub fn anomalies(&self) -> impl Iterator<Item = &ClassifiedTransaction> {
        self.rows.iter().filter(|r| r.anomaly.is_anomaly())
    }
}

/// Classifier plus anomaly settings for one run
pub struct Pipeline {
    classifier: Classifier,
    anomaly: AnomalyConfig,
}

impl Pipeline {
    pub fn new(classifier: Classifier, anomaly: AnomalyConfig) -> Self {
        Self {
            classifier,
            anomaly,
        }
    }

    /// Build a pipeline from loaded config and a model client
    pub fn from_config(config: &Config, ai: AIClient, prompts: &PromptLibrary) -> Result<Self> {
        let model = ModelClassifier::with_prompts(ai, prompts)?;
        let classifier = Classifier::new(config.categories.clone(), config.rules.clone(), model);
        Ok(Self::new(classifier, config.anomaly.clone()))
    }

    /// Report (current, total) while classifying
    pub fn with_progress(mut self, callback: ClassifyProgressCallback) -> Self {
        self.classifier = self.classifier.with_progress(callback);
        self
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Classify, label and summarize a batch
    pub async fn run(&self, transactions: Vec<Transaction>) -> PipelineOutput {
        let (results, stats) = self.classifier.classify_batch(&transactions).await;

        let categories: Vec<&str> = results.iter().map(|r| r.category.as_str()).collect();
        let anomalies = detect_anomalies(&transactions, &categories, &self.anomaly);
        let category_summary = category_summary(&transactions, &categories);
        let monthly_totals = monthly_totals(&transactions);
        let monthly_by_category = monthly_by_category(&transactions, &categories);

        let rows: Vec<ClassifiedTransaction> = transactions
            .into_iter()
            .zip(results)
            .zip(anomalies)
            .map(|((transaction, classification), anomaly)| ClassifiedTransaction {
                transaction,
                classification,
                anomaly,
            })
            .collect();

        let output = PipelineOutput {
            rows,
            stats,
            category_summary,
            monthly_totals,
            monthly_by_category,
        };

        info!(
            rows = output.rows.len(),
            anomalies = output.anomaly_count(),
            "Pipeline complete"
        );

        output
    }
}
