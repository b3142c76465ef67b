//! Anomaly labelling
//!
//! Four independent checks run over a classified batch, always in the same
//! order, so the label list of a row is deterministic:
//! 1. Batch-wide robust outlier
//! 2. Manual threshold (when configured)
//! 3. Possible duplicate
//! 4. Robust outlier within the row's category

use std::collections::HashMap;

use tracing::debug;

use crate::config::AnomalyConfig;
use crate::models::{AnomalyLabel, AnomalyRecord, Transaction};
use crate::normalize::normalize_for_match;
use crate::stats::mad_flags;

/// Key under which rows count as duplicates of each other
///
/// Built from parsed values, so `100` and `100.00` collide while
/// `2024-01-05` and `2024-01-06` do not.
pub fn duplicate_key(tx: &Transaction) -> String {
    format!(
        "{}|{}|{}",
        tx.date.format("%Y-%m-%d"),
        tx.amount,
        normalize_for_match(&tx.description)
    )
}

/// True for every row that shares its duplicate key with another row
pub fn duplicate_flags(transactions: &[Transaction]) -> Vec<bool> {
    let keys: Vec<String> = transactions.iter().map(duplicate_key).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for key in &keys {
        *counts.entry(key.as_str()).or_default() += 1;
    }
    keys.iter().map(|k| counts[k.as_str()] > 1).collect()
}

/// Robust outlier flags computed separately inside each category
///
/// `categories[i]` is the category of `transactions[i]`; rows without a
/// category entry are never flagged.
pub fn category_outlier_flags<S: AsRef<str>>(
    transactions: &[Transaction],
    categories: &[S],
    k: f64,
) -> Vec<bool> {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, category) in categories.iter().enumerate().take(transactions.len()) {
        groups.entry(category.as_ref()).or_default().push(i);
    }

    let mut flags = vec![false; transactions.len()];
    for (category, members) in groups {
        let amounts: Vec<Option<f64>> = members
            .iter()
            .map(|&i| Some(transactions[i].amount))
            .collect();
        for (&i, flagged) in members.iter().zip(mad_flags(&amounts, k)) {
            if flagged {
                debug!(category, row = i, "Unusual amount for category");
                flags[i] = true;
            }
        }
    }
    flags
}

/// Label every transaction of a batch
///
/// Pure function of its inputs: running it twice gives identical records.
pub fn detect_anomalies<S: AsRef<str>>(
    transactions: &[Transaction],
    categories: &[S],
    config: &AnomalyConfig,
) -> Vec<AnomalyRecord> {
    let amounts: Vec<Option<f64>> = transactions.iter().map(|t| Some(t.amount)).collect();

    let statistical = mad_flags(&amounts, config.mad_k);
    let duplicates = duplicate_flags(transactions);
    let per_category = category_outlier_flags(transactions, categories, config.mad_k);
    let threshold = config.effective_threshold();

    let records: Vec<AnomalyRecord> = transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| {
            let mut record = AnomalyRecord::default();
            if statistical[i] {
                record.push(AnomalyLabel::HighAmountStatistical);
            }
            if let Some(t) = threshold {
                if tx.amount > t {
                    record.push(AnomalyLabel::HighAmountManual(t));
                }
            }
            if duplicates[i] {
                record.push(AnomalyLabel::PossibleDuplicate);
            }
            if per_category[i] {
                record.push(AnomalyLabel::UnusualForCategory);
            }
            record
        })
        .collect();

    debug!(
        flagged = records.iter().filter(|r| r.is_anomaly()).count(),
        total = records.len(),
        "Anomaly detection complete"
    );

    records
}
