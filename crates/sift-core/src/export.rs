//! Export of classified batches
//!
//! Supports:
//! - Categorized transaction CSV (one row per input row, labels joined with "; ")
//! - JSON report with rows and every summary table

use std::io::Write;

use chrono::Utc;
use csv::WriterBuilder;
use serde::Serialize;

use crate::error::Result;
use crate::models::ClassifiedTransaction;
use crate::pipeline::PipelineOutput;
use crate::trends::{CategoryPivot, CategorySummary, MonthlyTotal};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// A flattened classified row
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow<L> {
    pub date: String,
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub confidence: f64,
    pub reason: String,
    pub method: String,
    pub anomaly_labels: L,
    pub is_anomaly: bool,
}

fn export_row<L>(row: &ClassifiedTransaction, labels: L) -> ExportRow<L> {
    ExportRow {
        date: row.transaction.date.format("%Y-%m-%d").to_string(),
        amount: row.transaction.amount,
        description: row.transaction.description.clone(),
        category: row.classification.category.clone(),
        confidence: row.classification.confidence,
        reason: row.classification.reason.clone(),
        method: row.classification.method.to_string(),
        anomaly_labels: labels,
        is_anomaly: row.anomaly.is_anomaly(),
    }
}

/// JSON report document
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub total_spend: f64,
    pub rows_processed: usize,
    pub anomalies_flagged: usize,
    pub category_summary: &'a [CategorySummary],
    pub monthly_totals: &'a [MonthlyTotal],
    pub monthly_by_category: &'a CategoryPivot,
    pub rows: Vec<ExportRow<Vec<String>>>,
}

/// Write the categorized rows as CSV
pub fn write_csv<W: Write>(output: &PipelineOutput, writer: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in &output.rows {
        wtr.serialize(export_row(row, row.anomaly.joined()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Categorized rows as a CSV string
pub fn to_csv_string(output: &PipelineOutput) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(output, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| crate::error::Error::InvalidData(format!("CSV output not UTF-8: {}", e)))
}

/// Build the JSON report document
pub fn json_report(output: &PipelineOutput) -> JsonReport<'_> {
    JsonReport {
        generated_at: Utc::now().to_rfc3339(),
        total_spend: output.total_spend(),
        rows_processed: output.rows.len(),
        anomalies_flagged: output.anomaly_count(),
        category_summary: &output.category_summary,
        monthly_totals: &output.monthly_totals,
        monthly_by_category: &output.monthly_by_category,
        rows: output
            .rows
            .iter()
            .map(|r| export_row(r, r.anomaly.label_strings()))
            .collect(),
    }
}

/// Write the JSON report (pretty-printed)
pub fn write_json<W: Write>(output: &PipelineOutput, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, &json_report(output))?;
    Ok(())
}

/// Write `output` in the requested format
pub fn write_export<W: Write>(output: &PipelineOutput, format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(output, writer),
        ExportFormat::Json => write_json(output, writer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ClassifyStats;
    use crate::models::{
        AnomalyLabel, AnomalyRecord, ClassificationMethod, ClassificationResult, Transaction,
    };
    use crate::trends::{category_summary, monthly_by_category, monthly_totals};
    use chrono::NaiveDate;

    fn sample_output() -> PipelineOutput {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let txs = vec![
            Transaction::new(date, 250.0, "Uber, airport"),
            Transaction::new(date, 5000.0, "Mystery"),
        ];
        let results = vec![
            ClassificationResult::new("Travel", 0.95, "Matched rule: UBER", ClassificationMethod::Rule),
            ClassificationResult::fallback(0.2, "LLM call failed; defaulted to Other"),
        ];
        let anomalies = vec![
            AnomalyRecord::default(),
            AnomalyRecord {
                labels: vec![
                    AnomalyLabel::HighAmountManual(1000.0),
                    AnomalyLabel::PossibleDuplicate,
                ],
            },
        ];
        let categories = ["Travel", "Other"];
        PipelineOutput {
            category_summary: category_summary(&txs, &categories),
            monthly_totals: monthly_totals(&txs),
            monthly_by_category: monthly_by_category(&txs, &categories),
            stats: ClassifyStats::default(),
            rows: txs
                .into_iter()
                .zip(results)
                .zip(anomalies)
                .map(|((transaction, classification), anomaly)| ClassifiedTransaction {
                    transaction,
                    classification,
                    anomaly,
                })
                .collect(),
        }
    }

    #[test]
    fn test_csv_export() {
        let csv = to_csv_string(&sample_output()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "date,amount,description,category,confidence,reason,method,anomaly_labels,is_anomaly"
        );
        assert_eq!(
            lines[1],
            "2024-06-01,250.0,\"Uber, airport\",Travel,0.95,Matched rule: UBER,rule,,false"
        );
        assert!(lines[2].contains("High amount (> 1000); Possible duplicate"));
        assert!(lines[2].ends_with(",true"));
        assert!(lines[2].contains(",fallback,"));
    }

    #[test]
    fn test_json_export() {
        let mut buf = Vec::new();
        write_export(&sample_output(), ExportFormat::Json, &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["rows_processed"], 2);
        assert_eq!(value["anomalies_flagged"], 1);
        assert_eq!(value["total_spend"], 5250.0);
        assert_eq!(value["rows"][1]["anomaly_labels"][0], "High amount (> 1000)");
        assert_eq!(value["rows"][0]["method"], "rule");
        assert_eq!(value["category_summary"][0]["category"], "Other");
        assert_eq!(value["monthly_by_category"]["categories"][0], "Other");
        assert_eq!(value["monthly_totals"][0]["month"], "2024-06");
    }

    #[test]
    fn test_export_format_parse() {
        assert_eq!("CSV".parse::<ExportFormat>(), Ok(ExportFormat::Csv));
        assert_eq!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
