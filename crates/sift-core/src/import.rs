//! CSV ledger import
//!
//! A ledger needs `date`, `amount` and `description` columns (header names
//! are trimmed and matched case-insensitively; extra columns are ignored).
//! Rows that fail to parse are kept aside with a reason instead of failing
//! the whole import.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::Transaction;
use crate::normalize::normalize_opt;

/// Columns every ledger must have
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "amount", "description"];

/// Currency markers stripped from amounts before parsing
const AMOUNT_NOISE: [&str; 5] = [",", "₹", "$", "INR", "Rs."];

/// A row that was excluded, with the raw field values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidRow {
    /// 1-based line number in the file (the header is line 1)
    pub line: usize,
    pub date: String,
    pub amount: String,
    pub description: String,
    pub reason: String,
}

/// Outcome of importing a ledger
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub transactions: Vec<Transaction>,
    pub invalid: Vec<InvalidRow>,
    /// Valid rows dropped by [`ImportResult::truncate`]
    pub truncated: usize,
}

impl ImportResult {
    /// Keep only the first `max_rows` valid transactions
    pub fn truncate(&mut self, max_rows: usize) {
        if self.transactions.len() > max_rows {
            let total = self.transactions.len();
            self.truncated = total - max_rows;
            self.transactions.truncate(max_rows);
            warn!(
                "Dataset has {} valid rows; processing only the first {}",
                total, max_rows
            );
        }
    }
}

/// Import a ledger CSV file
pub fn parse_ledger_file(path: &Path) -> Result<ImportResult> {
    let file = File::open(path)
        .map_err(|e| Error::Import(format!("Could not open {}: {}", path.display(), e)))?;
    parse_ledger(file)
}

/// Import a ledger from any CSV reader
pub fn parse_ledger<R: Read>(reader: R) -> Result<ImportResult> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !headers.iter().any(|h| h == c))
        .collect();
    if !missing.is_empty() {
        return Err(Error::Import(format!(
            "Missing required columns: {}. Required: {}",
            missing.join(", "),
            REQUIRED_COLUMNS.join(", ")
        )));
    }

    let column = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let (date_col, amount_col, desc_col) =
        (column("date"), column("amount"), column("description"));

    let mut result = ImportResult::default();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(i + 2);
        match parse_row(&record, date_col, amount_col, desc_col) {
            Ok(tx) => result.transactions.push(tx),
            Err(reason) => {
                debug!(line, %reason, "Skipping invalid row");
                result.invalid.push(InvalidRow {
                    line,
                    date: field(&record, date_col).to_string(),
                    amount: field(&record, amount_col).to_string(),
                    description: field(&record, desc_col).to_string(),
                    reason,
                });
            }
        }
    }

    debug!(
        valid = result.transactions.len(),
        invalid = result.invalid.len(),
        "Parsed ledger"
    );
    Ok(result)
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn parse_row(
    record: &StringRecord,
    date_col: usize,
    amount_col: usize,
    desc_col: usize,
) -> std::result::Result<Transaction, String> {
    let date = parse_date(field(record, date_col));
    let amount = parse_amount(field(record, amount_col));
    let description = normalize_opt(record.get(desc_col));

    let mut problems = Vec::new();
    if date.is_none() {
        problems.push("unparseable date");
    }
    if amount.is_none() {
        problems.push("unparseable amount");
    }
    if description.is_empty() {
        problems.push("empty description");
    }

    match (date, amount) {
        (Some(date), Some(amount)) if problems.is_empty() => {
            Ok(Transaction::new(date, amount, description))
        }
        _ => Err(problems.join("; ")),
    }
}

/// Parse a date string in various common formats
///
/// Month-first wins over day-first when both would parse.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%Y/%m/%d", // 2024/01/15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%d/%m/%Y", // 15/01/2024
        "%d-%m-%Y", // 15-01-2024
        "%d %b %Y", // 15 Jan 2024
        "%b %d, %Y", // Jan 15, 2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // Timestamps: 2024-01-15T10:30:00 or 2024-01-15 10:30:00
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Parse an amount string, stripping currency markers and thousands separators
///
/// `(100.00)` is read as `-100.00`. Non-finite results are rejected.
pub fn parse_amount(s: &str) -> Option<f64> {
    let mut cleaned = s.trim().to_string();
    for noise in AMOUNT_NOISE {
        cleaned = cleaned.replace(noise, "");
    }
    let cleaned: String = cleaned.chars().filter(|c| !c.is_whitespace()).collect();

    let cleaned = match cleaned.strip_prefix('(').and_then(|c| c.strip_suffix(')')) {
        Some(inner) => format!("-{}", inner),
        None => cleaned,
    };

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("01/15/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15/01/2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15-01-2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("15 Jan 2024"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15T09:12:00"), Some(date(2024, 1, 15)));
        assert_eq!(parse_date(" 2024-01-15 23:59:59 "), Some(date(2024, 1, 15)));
        // Ambiguous dates are month-first
        assert_eq!(parse_date("02/03/2024"), Some(date(2024, 2, 3)));
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2024-02-30"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("₹ 2,500"), Some(2500.0));
        assert_eq!(parse_amount("INR 799"), Some(799.0));
        assert_eq!(parse_amount("Rs. 45.50"), Some(45.5));
        assert_eq!(parse_amount("$12"), Some(12.0));
        assert_eq!(parse_amount("-123.45"), Some(-123.45));
        assert_eq!(parse_amount("(100.00)"), Some(-100.0));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_ledger() {
        let csv = " Date ,AMOUNT,Description,Notes
2024-01-15,\"1,200\",  Uber   trip ,work
2024-01-16,abc,Swiggy,
not-a-date,50,Tea,
2024-01-17,80,   ,
2024-01-18,₹ 99.5,Zomato order,x
";
        let result = parse_ledger(csv.as_bytes()).unwrap();
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.transactions[0].description, "Uber trip");
        assert_eq!(result.transactions[0].amount, 1200.0);
        assert_eq!(result.transactions[1].amount, 99.5);

        assert_eq!(result.invalid.len(), 3);
        assert_eq!(result.invalid[0].line, 3);
        assert_eq!(result.invalid[0].reason, "unparseable amount");
        assert_eq!(result.invalid[1].reason, "unparseable date");
        assert_eq!(result.invalid[2].reason, "empty description");
        assert_eq!(result.invalid[2].amount, "80");
    }

    #[test]
    fn test_short_rows_are_invalid_not_errors() {
        let csv = "date,amount,description\n2024-01-15,10\n";
        let result = parse_ledger(csv.as_bytes()).unwrap();
        assert!(result.transactions.is_empty());
        assert_eq!(result.invalid[0].reason, "empty description");
    }

    #[test]
    fn test_missing_columns() {
        let err = parse_ledger("Date,Value,Memo\n2024-01-01,1,x\n".as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Missing required columns: amount, description"));
    }

    #[test]
    fn test_truncate() {
        let csv = "date,amount,description\n2024-01-01,1,a\n2024-01-02,2,b\n2024-01-03,3,c\n";
        let mut result = parse_ledger(csv.as_bytes()).unwrap();
        result.truncate(2);
        assert_eq!(result.transactions.len(), 2);
        assert_eq!(result.truncated, 1);
        assert_eq!(result.transactions[1].description, "b");

        result.truncate(10);
        assert_eq!(result.truncated, 1);
    }

    #[test]
    fn test_parse_ledger_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        std::fs::write(&path, "date,amount,description\n2024-05-01,42,Coffee\n").unwrap();
        let result = parse_ledger_file(&path).unwrap();
        assert_eq!(result.transactions.len(), 1);
        assert!(parse_ledger_file(&dir.path().join("missing.csv")).is_err());
    }
}
