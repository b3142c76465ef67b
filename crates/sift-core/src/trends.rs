//! Monthly trends and category summaries

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::Transaction;

/// Total spend in one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub amount: f64,
}

/// Month × category table of totals
///
/// `rows[i].amounts[j]` is the total for `categories[j]` in `rows[i].month`;
/// months with no spend in a category hold `0.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryPivot {
    pub categories: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub month: String,
    pub amounts: Vec<f64>,
}

impl CategoryPivot {
    /// Total for one month and category, if both exist
    pub fn get(&self, month: &str, category: &str) -> Option<f64> {
        let col = self.categories.iter().position(|c| c == category)?;
        self.rows
            .iter()
            .find(|r| r.month == month)
            .map(|r| r.amounts[col])
    }
}

/// Spend attributed to one category across the batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub amount: f64,
    pub count: usize,
    /// Share of total spend, rounded to 2 decimal places
    pub percent: f64,
}

/// Sum of amounts per month, months ascending
pub fn monthly_totals(transactions: &[Transaction]) -> Vec<MonthlyTotal> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(tx.month()).or_default() += tx.amount;
    }
    totals
        .into_iter()
        .map(|(month, amount)| MonthlyTotal { month, amount })
        .collect()
}

/// Pivot of totals by month and category
///
/// Columns are the categories that appear in the batch, sorted by name.
pub fn monthly_by_category<S: AsRef<str>>(
    transactions: &[Transaction],
    categories: &[S],
) -> CategoryPivot {
    let mut cells: BTreeMap<String, BTreeMap<&str, f64>> = BTreeMap::new();
    let mut columns: BTreeSet<&str> = BTreeSet::new();

    for (tx, category) in transactions.iter().zip(categories) {
        let category = category.as_ref();
        columns.insert(category);
        *cells
            .entry(tx.month())
            .or_default()
            .entry(category)
            .or_default() += tx.amount;
    }

    let names: Vec<&str> = columns.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(month, by_category)| PivotRow {
            month,
            amounts: names
                .iter()
                .map(|c| by_category.get(c).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect();

    CategoryPivot {
        categories: names.into_iter().map(str::to_string).collect(),
        rows,
    }
}

/// Per-category totals, largest first
///
/// Ties keep category-name order. Percent is 0 for every row when the
/// batch total is zero.
pub fn category_summary<S: AsRef<str>>(
    transactions: &[Transaction],
    categories: &[S],
) -> Vec<CategorySummary> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for (tx, category) in transactions.iter().zip(categories) {
        let entry = groups.entry(category.as_ref()).or_default();
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let total: f64 = groups.values().map(|(amount, _)| amount).sum();

    let mut summary: Vec<CategorySummary> = groups
        .into_iter()
        .map(|(category, (amount, count))| CategorySummary {
            category: category.to_string(),
            amount,
            count,
            percent: if total != 0.0 {
                round2(amount / total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    summary.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    summary
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(y: i32, m: u32, d: u32, amount: f64) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), amount, "x")
    }

    #[test]
    fn test_monthly_totals_sorted() {
        let txs = vec![
            tx(2024, 3, 2, 50.0),
            tx(2023, 12, 31, 10.0),
            tx(2024, 3, 20, 25.5),
            tx(2024, 1, 1, 7.0),
        ];
        let totals = monthly_totals(&txs);
        let months: Vec<_> = totals.iter().map(|t| t.month.as_str()).collect();
        assert_eq!(months, vec!["2023-12", "2024-01", "2024-03"]);
        assert_eq!(totals[2].amount, 75.5);
        assert!(monthly_totals(&[]).is_empty());
    }

    #[test]
    fn test_pivot_zero_fills_and_sorts_columns() {
        let txs = vec![
            tx(2024, 1, 5, 100.0),
            tx(2024, 1, 9, 40.0),
            tx(2024, 2, 1, 60.0),
            tx(2024, 1, 12, 10.0),
        ];
        let pivot = monthly_by_category(&txs, &["Travel", "Meals", "Travel", "Meals"]);
        assert_eq!(pivot.categories, vec!["Meals", "Travel"]);
        assert_eq!(pivot.rows.len(), 2);
        assert_eq!(pivot.rows[0].month, "2024-01");
        assert_eq!(pivot.rows[0].amounts, vec![50.0, 100.0]);
        assert_eq!(pivot.rows[1].amounts, vec![0.0, 60.0]);
        assert_eq!(pivot.get("2024-02", "Meals"), Some(0.0));
        assert_eq!(pivot.get("2024-03", "Meals"), None);
        assert_eq!(pivot.get("2024-01", "Rent"), None);
    }

    #[test]
    fn test_category_summary() {
        let txs = vec![
            tx(2024, 1, 1, 300.0),
            tx(2024, 1, 2, 100.0),
            tx(2024, 1, 3, 200.0),
            tx(2024, 1, 4, 0.0),
        ];
        let summary = category_summary(&txs, &["Travel", "Meals", "Travel", "Other"]);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].category, "Travel");
        assert_eq!(summary[0].amount, 500.0);
        assert_eq!(summary[0].count, 2);
        assert_eq!(summary[0].percent, 83.33);
        assert_eq!(summary[1].percent, 16.67);
        assert_eq!(summary[2].category, "Other");
        assert_eq!(summary[2].percent, 0.0);
    }

    #[test]
    fn test_category_summary_zero_total() {
        let txs = vec![tx(2024, 1, 1, 0.0), tx(2024, 1, 2, 0.0)];
        let summary = category_summary(&txs, &["A", "B"]);
        assert!(summary.iter().all(|s| s.percent == 0.0));
        assert_eq!(summary[0].category, "A");
    }
}
