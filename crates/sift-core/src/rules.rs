//! Keyword rule table and matcher
//!
//! Rules are evaluated in table order against the normalized description and
//! the first keyword found as a substring wins. There is no scoring and no
//! longest-match preference.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::normalize::normalize_for_match;

/// Confidence assigned to every rule hit
pub const RULE_CONFIDENCE: f64 = 0.95;

/// One keyword → category mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantRule {
    pub keyword: String,
    pub category: String,
}

impl MerchantRule {
    pub fn new(keyword: &str, category: &str) -> Self {
        Self {
            keyword: keyword.trim().to_uppercase(),
            category: category.trim().to_string(),
        }
    }
}

/// Ordered keyword → category table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<MerchantRule>", into = "Vec<MerchantRule>")]
pub struct RuleTable {
    rules: Vec<MerchantRule>,
}

/// A successful rule lookup
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<'a> {
    pub keyword: &'a str,
    pub category: &'a str,
    pub confidence: f64,
    pub reason: String,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from (keyword, category) pairs, keeping their order
    pub fn from_pairs<I, K, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: AsRef<str>,
    {
        let mut table = Self::new();
        for (keyword, category) in pairs {
            table.insert(keyword.as_ref(), category.as_ref());
        }
        table
    }

    /// Add a rule at the end of the table
    ///
    /// The keyword is trimmed and upper-cased. Blank keywords or categories are
    /// ignored. Re-inserting an existing keyword updates its category but keeps
    /// its original position.
    pub fn insert(&mut self, keyword: &str, category: &str) {
        let rule = MerchantRule::new(keyword, category);
        if rule.keyword.is_empty() || rule.category.is_empty() {
            return;
        }
        if normalize_for_match(&rule.keyword) != rule.keyword {
            warn!(
                keyword = %rule.keyword,
                "Rule keyword contains characters removed by normalization and may never match"
            );
        }
        if let Some(existing) = self.rules.iter_mut().find(|r| r.keyword == rule.keyword) {
            existing.category = rule.category;
        } else {
            self.rules.push(rule);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &MerchantRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule whose keyword occurs in `normalized_description`
    pub fn find_match(&self, normalized_description: &str) -> Option<RuleMatch<'_>> {
        self.rules
            .iter()
            .find(|rule| normalized_description.contains(rule.keyword.as_str()))
            .map(|rule| RuleMatch {
                keyword: &rule.keyword,
                category: &rule.category,
                confidence: RULE_CONFIDENCE,
                reason: format!("Matched rule: {}", rule.keyword),
            })
    }
}

impl From<Vec<MerchantRule>> for RuleTable {
    fn from(rules: Vec<MerchantRule>) -> Self {
        Self::from_pairs(rules.into_iter().map(|r| (r.keyword, r.category)))
    }
}

impl From<RuleTable> for Vec<MerchantRule> {
    fn from(table: RuleTable) -> Self {
        table.rules
    }
}
