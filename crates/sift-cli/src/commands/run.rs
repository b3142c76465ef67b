//! Ledger run and single-description classification

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sift_core::export::write_export;
use sift_core::{
    import::parse_ledger_file, ClassificationResult, Classifier, Config, ExportFormat,
    ModelClassifier, Pipeline, PipelineOutput, PromptLibrary,
};
use tracing::warn;

use super::{build_client, format_amount, truncate};

/// Anomalies listed in the printed report
const REPORT_ANOMALY_LIMIT: usize = 15;

/// Options for `sift run`
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output: Option<PathBuf>,
    pub format: ExportFormat,
    pub threshold: Option<f64>,
    pub max_rows: Option<usize>,
    pub quiet: bool,
    pub no_llm: bool,
    pub model: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output: None,
            format: ExportFormat::Csv,
            threshold: None,
            max_rows: None,
            quiet: false,
            no_llm: false,
            model: None,
        }
    }
}

/// Import a ledger, classify every row, flag anomalies, print and export
pub async fn cmd_run(mut config: Config, file: &Path, opts: RunOptions) -> Result<()> {
    if let Some(threshold) = opts.threshold {
        config.anomaly.manual_threshold = Some(threshold);
    }
    let max_rows = opts.max_rows.unwrap_or(config.max_rows);

    if !opts.quiet {
        println!("📂 Importing {}...", file.display());
    }

    let mut import = parse_ledger_file(file)
        .with_context(|| format!("Failed to import {}", file.display()))?;

    if !import.invalid.is_empty() {
        warn!("Skipped {} invalid rows", import.invalid.len());
        if !opts.quiet {
            println!("   ⚠️  Skipped {} invalid rows:", import.invalid.len());
            for row in import.invalid.iter().take(5) {
                println!(
                    "      line {}: {} ({})",
                    row.line,
                    truncate(&row.description, 30),
                    row.reason
                );
            }
            if import.invalid.len() > 5 {
                println!("      ... and {} more", import.invalid.len() - 5);
            }
        }
    }

    import.truncate(max_rows);
    if import.truncated > 0 && !opts.quiet {
        println!(
            "   ✂️  Processing first {} rows ({} dropped, raise --max-rows to include them)",
            max_rows, import.truncated
        );
    }

    if import.transactions.is_empty() {
        anyhow::bail!("No valid transactions in {}", file.display());
    }

    let ai = build_client(&config, opts.no_llm, opts.model.as_deref())?;
    let model_disabled = ai.is_disabled();
    let mut pipeline = Pipeline::from_config(&config, ai, &PromptLibrary::new())
        .context("Failed to build classifier")?;

    if !opts.quiet {
        println!(
            "   Classifying {} transactions...",
            import.transactions.len()
        );
        pipeline = pipeline.with_progress(Box::new(|current: usize, total: usize| {
            if current % 25 == 0 || current == total {
                eprint!("\r   {}/{}", current, total);
                if current == total {
                    eprintln!();
                }
            }
        }));
    }

    let output = pipeline.run(import.transactions).await;

    if !opts.quiet {
        print_report(&output, model_disabled);
    }

    match &opts.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_export(&output, opts.format, BufWriter::new(file))
                .context("Failed to write export")?;
            if !opts.quiet {
                println!("\n✅ Wrote {} rows to {}", output.rows.len(), path.display());
            }
        }
        None if opts.quiet => {
            let stdout = io::stdout();
            write_export(&output, opts.format, stdout.lock())
                .context("Failed to write export")?;
        }
        None => {}
    }

    Ok(())
}

/// Classify one description and print the result
pub async fn cmd_classify(
    config: Config,
    description: &str,
    no_llm: bool,
    model: Option<&str>,
) -> Result<()> {
    let ai = build_client(&config, no_llm, model)?;
    let model = ModelClassifier::with_prompts(ai, &PromptLibrary::new())
        .context("Failed to load classification prompt")?;
    let classifier = Classifier::new(config.categories, config.rules, model);

    let result = classifier.classify_one(description).await;
    print_classification(description, &result);
    Ok(())
}

/// Summary label for `llm`-tagged rows; disabled-backend answers are tagged `llm` too
pub fn model_line_label(model_disabled: bool) -> &'static str {
    if model_disabled {
        "By model (disabled):"
    } else {
        "By model:"
    }
}

fn print_classification(description: &str, result: &ClassificationResult) {
    println!("🏷️  {}", description);
    println!("   Category:   {}", result.category);
    println!("   Confidence: {:.2}", result.confidence);
    println!("   Method:     {}", result.method);
    println!("   Reason:     {}", result.reason);
}

fn print_report(output: &PipelineOutput, model_disabled: bool) {
    let stats = &output.stats;
    println!();
    println!("📊 Classification Summary");
    println!("   Processed: {}", stats.processed);
    println!("   By rule:   {}", stats.by_rule);
    println!("   {:<10} {}", model_line_label(model_disabled), stats.by_llm);
    println!("   Fallback:  {}", stats.fallback);

    println!();
    println!("💰 Spending by Category");
    println!();
    println!("{:<24} │ {:>14} │ {:>6} │ {:>7}", "Category", "Amount", "Count", "%");
    println!("{}", "─".repeat(60));
    for summary in &output.category_summary {
        println!(
            "{:<24} │ {:>14} │ {:>6} │ {:>6.2}%",
            truncate(&summary.category, 24),
            format_amount(summary.amount),
            summary.count,
            summary.percent
        );
    }
    println!("{}", "─".repeat(60));
    println!("{:<24} │ {:>14} │", "Total", format_amount(output.total_spend()));

    println!();
    println!("📅 Monthly Totals");
    println!();
    for month in &output.monthly_totals {
        println!("   {}  {:>14}", month.month, format_amount(month.amount));
    }

    let pivot = &output.monthly_by_category;
    if !pivot.categories.is_empty() {
        println!();
        println!("📈 Monthly by Category");
        println!();
        let mut header = format!("{:<8}", "Month");
        for category in &pivot.categories {
            header.push_str(&format!(" │ {:>12}", truncate(category, 12)));
        }
        println!("{}", header);
        println!("{}", "─".repeat(header.chars().count()));
        for row in &pivot.rows {
            let mut line = format!("{:<8}", row.month);
            for amount in &row.amounts {
                line.push_str(&format!(" │ {:>12}", format_amount(*amount)));
            }
            println!("{}", line);
        }
    }

    println!();
    let count = output.anomaly_count();
    if count == 0 {
        println!("✅ No anomalies flagged");
        return;
    }

    println!("🚨 Anomalies ({})", count);
    println!();
    println!(
        "{:<10} │ {:>12} │ {:<30} │ {:<16} │ Labels",
        "Date", "Amount", "Description", "Category"
    );
    println!("{}", "─".repeat(110));
    for row in output.anomalies().take(REPORT_ANOMALY_LIMIT) {
        println!(
            "{:<10} │ {:>12} │ {:<30} │ {:<16} │ {}",
            row.transaction.date.format("%Y-%m-%d"),
            format_amount(row.transaction.amount),
            truncate(&row.transaction.description, 30),
            truncate(&row.classification.category, 16),
            row.anomaly.joined()
        );
    }
    if count > REPORT_ANOMALY_LIMIT {
        println!("   ... and {} more", count - REPORT_ANOMALY_LIMIT);
    }
}
