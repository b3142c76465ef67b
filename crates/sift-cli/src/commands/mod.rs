//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config loading, model client selection)
//! - `run` - Ledger categorization and single-description classification
//! - `rules` - Rule and category inspection
//! - `config` - Effective config, override path, embedded defaults and prompt
//! - `ollama` - Ollama connection test

pub mod config;
pub mod core;
pub mod ollama;
pub mod rules;
pub mod run;

// Re-export command functions for main.rs
pub use config::*;
pub use core::*;
pub use ollama::*;
pub use rules::*;
pub use run::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Format an amount with thousands separators and two decimals
pub fn format_amount(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{}{}.{}", sign, grouped, frac)
}
