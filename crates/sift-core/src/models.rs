//! Domain models for Sift

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Sentinel category every category set contains
pub const OTHER_CATEGORY: &str = "Other";

/// Maximum length (in characters) of a classification reason
pub const MAX_REASON_CHARS: usize = 180;

/// A validated ledger row
///
/// Only rows whose date, amount and description all parsed make it this far;
/// see [`crate::import::ParsedRow`] for the raw form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub description: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: f64, description: impl Into<String>) -> Self {
        Self {
            date,
            amount,
            description: description.into(),
        }
    }

    /// Calendar month bucket, e.g. `2024-03`
    pub fn month(&self) -> String {
        self.date.format("%Y-%m").to_string()
    }
}

/// Ordered set of category names, always containing "Other"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySet {
    names: Vec<String>,
}

impl CategorySet {
    /// Build a category set from user input
    ///
    /// Names are trimmed, blanks and repeats are dropped, and "Other" is
    /// appended when missing. Order of first appearance is kept.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() || out.iter().any(|n| n == name) {
                continue;
            }
            out.push(name.to_string());
        }
        if !out.iter().any(|n| n == OTHER_CATEGORY) {
            out.push(OTHER_CATEGORY.to_string());
        }
        Self { names: out }
    }

    /// Exact, case-sensitive membership test
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Never true: "Other" is always present
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Comma-separated list for prompts and display
    pub fn joined(&self) -> String {
        self.names.join(", ")
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::from_names([OTHER_CATEGORY])
    }
}

impl From<Vec<String>> for CategorySet {
    fn from(names: Vec<String>) -> Self {
        Self::from_names(names)
    }
}

impl From<CategorySet> for Vec<String> {
    fn from(set: CategorySet) -> Self {
        set.names
    }
}

/// How a classification was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationMethod {
    /// Deterministic keyword rule
    Rule,
    /// Validated, in-set model reply
    Llm,
    /// Safe default after a failure or an override
    Fallback,
}

impl ClassificationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rule => "rule",
            Self::Llm => "llm",
            Self::Fallback => "fallback",
        }
    }
}

impl std::str::FromStr for ClassificationMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rule" => Ok(Self::Rule),
            "llm" => Ok(Self::Llm),
            "fallback" => Ok(Self::Fallback),
            _ => Err(format!("Unknown classification method: {}", s)),
        }
    }
}

impl std::fmt::Display for ClassificationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Category assigned to one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub category: String,
    pub confidence: f64,
    pub reason: String,
    pub method: ClassificationMethod,
}

impl ClassificationResult {
    pub fn new(
        category: impl Into<String>,
        confidence: f64,
        reason: &str,
        method: ClassificationMethod,
    ) -> Self {
        Self {
            category: category.into(),
            confidence: confidence.clamp(0.0, 1.0),
            reason: truncate_reason(reason),
            method,
        }
    }

    /// "Other" with the given confidence, tagged as a fallback
    pub fn fallback(confidence: f64, reason: &str) -> Self {
        Self::new(
            OTHER_CATEGORY,
            confidence,
            reason,
            ClassificationMethod::Fallback,
        )
    }
}

/// Cut a reason down to [`MAX_REASON_CHARS`] characters
pub fn truncate_reason(reason: &str) -> String {
    if reason.chars().count() <= MAX_REASON_CHARS {
        reason.to_string()
    } else {
        reason.chars().take(MAX_REASON_CHARS).collect()
    }
}

/// A reason a transaction was flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AnomalyLabel {
    /// Above the batch-wide robust threshold
    HighAmountStatistical,
    /// Above the user-supplied threshold
    HighAmountManual(f64),
    /// Same date, amount and normalized description as another row
    PossibleDuplicate,
    /// Above the robust threshold of its own category
    UnusualForCategory,
}

impl std::fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HighAmountStatistical => write!(f, "High amount (statistical)"),
            Self::HighAmountManual(threshold) => write!(f, "High amount (> {})", threshold),
            Self::PossibleDuplicate => write!(f, "Possible duplicate"),
            Self::UnusualForCategory => write!(f, "Unusual for category"),
        }
    }
}

impl From<AnomalyLabel> for String {
    fn from(label: AnomalyLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for AnomalyLabel {
    type Error = String;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        match s.as_str() {
            "High amount (statistical)" => return Ok(Self::HighAmountStatistical),
            "Possible duplicate" => return Ok(Self::PossibleDuplicate),
            "Unusual for category" => return Ok(Self::UnusualForCategory),
            _ => {}
        }
        s.strip_prefix("High amount (> ")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|t| t.parse::<f64>().ok())
            .map(Self::HighAmountManual)
            .ok_or_else(|| format!("Unknown anomaly label: {}", s))
    }
}

/// Anomaly labels for one transaction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub labels: Vec<AnomalyLabel>,
}

impl AnomalyRecord {
    pub fn push(&mut self, label: AnomalyLabel) {
        self.labels.push(label);
    }

    pub fn is_anomaly(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Labels as display strings, in evaluation order
    pub fn label_strings(&self) -> Vec<String> {
        self.labels.iter().map(ToString::to_string).collect()
    }

    /// Labels joined with "; " for CSV and table output
    pub fn joined(&self) -> String {
        self.label_strings().join("; ")
    }
}

/// A transaction with its classification and anomaly labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub transaction: Transaction,
    pub classification: ClassificationResult,
    pub anomaly: AnomalyRecord,
}
