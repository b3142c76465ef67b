//! Rule and category inspection

use anyhow::Result;
use sift_core::normalize::{normalize_for_match, normalize_text};
use sift_core::Config;

/// List rules in evaluation order
pub fn cmd_rules_list(config: &Config) -> Result<()> {
    if config.rules.is_empty() {
        println!("No merchant rules configured.");
        return Ok(());
    }

    println!("📏 Merchant Rules ({}, first match wins)\n", config.rules.len());
    println!("{:>4} │ {:<28} │ {}", "#", "Keyword", "Category");
    println!("{}", "─".repeat(60));

    for (i, rule) in config.rules.iter().enumerate() {
        let marker = if config.categories.contains(&rule.category) {
            ""
        } else {
            "  ⚠️  unknown category"
        };
        println!(
            "{:>4} │ {:<28} │ {}{}",
            i + 1,
            rule.keyword,
            rule.category,
            marker
        );
    }

    Ok(())
}

/// Show the normalized text and the first rule that matches it
pub fn cmd_rules_test(config: &Config, description: &str) -> Result<()> {
    let normalized = normalize_for_match(&normalize_text(description));
    println!("Input:      {}", description);
    println!("Normalized: {}", normalized);
    println!();

    match config.rules.find_match(&normalized) {
        Some(hit) if config.categories.contains(hit.category) => {
            println!("✅ Rule '{}' → {} ({:.2})", hit.keyword, hit.category, hit.confidence);
        }
        Some(hit) => {
            println!(
                "⚠️  Rule '{}' → {}, which is not a configured category (would be forced to Other)",
                hit.keyword, hit.category
            );
        }
        None => {
            println!("No rule matches; the model would classify this description.");
        }
    }

    Ok(())
}

/// List the allowed categories
pub fn cmd_categories(config: &Config) -> Result<()> {
    println!("🗂️  Categories ({})\n", config.categories.len());
    for name in config.categories.iter() {
        println!("  - {}", name);
    }
    Ok(())
}
