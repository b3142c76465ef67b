//! Integration tests for sift-core
//!
//! These tests exercise the full import → classify → anomaly → export workflow.

use serde_json::json;
use sift_core::{
    export::{to_csv_string, write_json},
    import::parse_ledger,
    models::OTHER_CATEGORY,
    normalize::normalize_for_match,
    AIClient, AnomalyConfig, CategorySet, ClassificationMethod, Classifier, Config, MockBackend,
    ModelClassifier, Pipeline, PromptLibrary, RuleTable,
};

/// Ledger with rule hits, model misses, one spike, one duplicate pair and a bad row
fn sample_ledger() -> String {
    let mut csv = String::from("Date,Amount,Description\n");
    let days = [2, 3, 4, 5, 8, 9, 10, 11, 12, 15, 16, 17];
    for (i, day) in days.iter().enumerate() {
        csv.push_str(&format!("2024-01-{:02},{},Uber trip {}\n", day, 95 + i * 2, i));
    }
    csv.push_str("2024-01-20,\"50,000\",Uber premier outstation\n");
    csv.push_str("2024-02-01,105,Swiggy dinner\n");
    csv.push_str("2024-02-01,105.00,SWIGGY  dinner!\n");
    csv.push_str("2024-02-03,oops,Broken row\n");
    csv
}

fn config() -> Config {
    Config::from_toml_str(
        r#"
categories = ["Travel", "Meals", "Utilities"]

[[rules]]
keyword = "UBER"
category = "Travel"

[[rules]]
keyword = "NETFLIX"
category = "Entertainment"

[anomaly]
manual_threshold = 1000.0
"#,
    )
    .expect("valid config")
}

fn pipeline(config: &Config, ai: AIClient) -> Pipeline {
    Pipeline::from_config(config, ai, &PromptLibrary::embedded_only()).expect("pipeline")
}

// =============================================================================
// Full workflow
// =============================================================================

#[tokio::test]
async fn test_full_workflow() {
    let import = parse_ledger(sample_ledger().as_bytes()).expect("ledger parses");
    assert_eq!(import.transactions.len(), 15);
    assert_eq!(import.invalid.len(), 1);
    assert_eq!(import.invalid[0].reason, "unparseable amount");

    let config = config();
    let output = pipeline(&config, AIClient::mock())
        .run(import.transactions)
        .await;

    assert_eq!(output.rows.len(), 15);
    for row in &output.rows {
        assert!(config.categories.contains(&row.classification.category));
        assert!((0.0..=1.0).contains(&row.classification.confidence));
        assert!(row.classification.reason.chars().count() <= 180);
    }

    // Rule hits
    let spike = &output.rows[12];
    assert_eq!(spike.classification.category, "Travel");
    assert_eq!(spike.classification.method, ClassificationMethod::Rule);
    assert_eq!(
        spike.anomaly.label_strings(),
        vec![
            "High amount (statistical)",
            "High amount (> 1000)",
            "Unusual for category",
        ]
    );

    // Model classification and duplicates
    let (a, b) = (&output.rows[13], &output.rows[14]);
    assert_eq!(a.classification.category, "Meals");
    assert_eq!(a.classification.method, ClassificationMethod::Llm);
    assert_eq!(a.anomaly.label_strings(), vec!["Possible duplicate"]);
    assert_eq!(b.anomaly.label_strings(), vec!["Possible duplicate"]);

    // The ordinary rides are clean
    assert!(output.rows[..12].iter().all(|r| !r.anomaly.is_anomaly()));
    assert_eq!(output.anomaly_count(), 3);

    // Summaries
    assert_eq!(output.monthly_totals.len(), 2);
    assert_eq!(output.monthly_totals[0].month, "2024-01");
    assert_eq!(output.monthly_by_category.categories, vec!["Meals", "Travel"]);
    assert_eq!(output.monthly_by_category.get("2024-01", "Meals"), Some(0.0));
    assert_eq!(output.category_summary[0].category, "Travel");
    let percent_total: f64 = output.category_summary.iter().map(|s| s.percent).sum();
    assert!((percent_total - 100.0).abs() < 0.02);

    // Exports
    let csv = to_csv_string(&output).expect("csv export");
    assert_eq!(csv.lines().count(), 16);
    assert!(csv.contains("High amount (statistical); High amount (> 1000); Unusual for category"));

    let mut buf = Vec::new();
    write_json(&output, &mut buf).expect("json export");
    let report: serde_json::Value = serde_json::from_slice(&buf).unwrap();
    assert_eq!(report["rows_processed"], 15);
    assert_eq!(report["anomalies_flagged"], 3);
}

#[tokio::test]
async fn test_anomaly_labels_are_stable_across_runs() {
    let import = parse_ledger(sample_ledger().as_bytes()).unwrap();
    let config = config();
    let p = pipeline(&config, AIClient::mock());

    let first = p.run(import.transactions.clone()).await;
    let second = p.run(import.transactions).await;
    let labels = |o: &sift_core::PipelineOutput| -> Vec<Vec<String>> {
        o.rows.iter().map(|r| r.anomaly.label_strings()).collect()
    };
    assert_eq!(labels(&first), labels(&second));
}

// =============================================================================
// Classification edge cases
// =============================================================================

#[tokio::test]
async fn test_model_outside_category_set() {
    let mock = MockBackend::fixed(json!({"category": "Crypto", "confidence": 0.93, "reason": "exchange"}));
    let model = ModelClassifier::with_prompts(AIClient::Mock(mock), &PromptLibrary::embedded_only())
        .unwrap();
    let classifier = Classifier::new(
        CategorySet::from_names(["Travel", "Meals"]),
        RuleTable::new(),
        model,
    );

    let result = classifier.classify_one("WAZIRX DEPOSIT").await;
    assert_eq!(result.category, OTHER_CATEGORY);
    assert!(result.confidence <= 0.4);
    assert_eq!(result.method, ClassificationMethod::Fallback);
}

#[tokio::test]
async fn test_disabled_backend_marks_misses_other() {
    let config = config();
    let output = pipeline(&config, AIClient::disabled())
        .run(
            parse_ledger("date,amount,description\n2024-03-01,120,Corner bakery\n".as_bytes())
                .unwrap()
                .transactions,
        )
        .await;

    let row = &output.rows[0];
    assert_eq!(row.classification.category, OTHER_CATEGORY);
    assert_eq!(row.classification.confidence, 0.2);
    assert_eq!(row.classification.reason, "LLM disabled");
}

#[tokio::test]
async fn test_unreachable_model_server_falls_back() {
    let mut config = config();
    // Nothing listens on port 9 of localhost
    config.ai.host = "http://127.0.0.1:9".to_string();
    config.ai.timeout = std::time::Duration::from_secs(2);
    let ai = AIClient::from_config(&config.ai).unwrap();

    let output = pipeline(&config, ai)
        .run(
            parse_ledger("date,amount,description\n2024-03-01,120,Corner bakery\n".as_bytes())
                .unwrap()
                .transactions,
        )
        .await;

    let row = &output.rows[0];
    assert_eq!(row.classification.category, OTHER_CATEGORY);
    assert_eq!(row.classification.reason, "LLM call failed; defaulted to Other");
    assert_eq!(row.classification.method, ClassificationMethod::Fallback);
}

#[tokio::test]
async fn test_default_rules_cover_common_merchants() {
    let config = Config::embedded().unwrap();
    let classifier = Classifier::new(
        config.categories.clone(),
        config.rules.clone(),
        ModelClassifier::with_prompts(AIClient::Mock(MockBackend::failing()), &PromptLibrary::embedded_only())
            .unwrap(),
    );

    // Every default rule must point at a default category
    for rule in config.rules.iter() {
        assert!(
            config.categories.contains(&rule.category),
            "rule {} maps to unknown category {}",
            rule.keyword,
            rule.category
        );
        assert_eq!(normalize_for_match(&rule.keyword), rule.keyword);
    }

    let result = classifier.classify_one("UBER *TRIP HELP.UBER.COM").await;
    assert_eq!(result.method, ClassificationMethod::Rule);
}

// =============================================================================
// Anomaly scenarios
// =============================================================================

#[test]
fn test_manual_threshold_boundary() {
    use chrono::NaiveDate;
    use sift_core::Transaction;

    let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let txs = vec![
        Transaction::new(d, 1500.0, "Monitor"),
        Transaction::new(d, 1000.0, "Keyboard"),
    ];
    let config = AnomalyConfig {
        manual_threshold: Some(1000.0),
        ..AnomalyConfig::default()
    };
    let records = sift_core::detect_anomalies(&txs, &["Office", "Office"], &config);
    assert_eq!(records[0].label_strings(), vec!["High amount (> 1000)"]);
    assert!(!records[1].is_anomaly());
}
