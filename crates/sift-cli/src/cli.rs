//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Sift - Categorize expenses and flag unusual spending
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Local-first expense categorizer and anomaly detector", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/sift/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that override the model backend for one invocation
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Skip the model; rule misses become low-confidence "Other"
    #[arg(long)]
    pub no_llm: bool,

    /// Model name override (e.g. llama3.1:8b)
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Categorize a ledger CSV and flag anomalies
    Run {
        /// CSV file with date, amount and description columns
        #[arg(short, long)]
        file: PathBuf,

        /// Write the categorized rows here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv, json
        #[arg(long, default_value = "csv")]
        format: String,

        /// Flag amounts strictly above this value
        #[arg(long)]
        threshold: Option<f64>,

        /// Process at most this many valid rows
        #[arg(long)]
        max_rows: Option<usize>,

        /// Skip the printed summary report
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Classify a single description
    Classify {
        /// Transaction description
        description: String,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Inspect merchant keyword rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// List the configured categories
    Categories,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Ollama connection utilities
    Ollama {
        #[command(subcommand)]
        action: OllamaAction,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List rules in evaluation order
    List,

    /// Show which rule (if any) matches a description
    Test {
        /// Transaction description
        description: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the override file path
    Path,

    /// Print the embedded default config (a starting point for overrides)
    Default,

    /// Show the classification prompt in use and where to override it
    Prompt,
}

#[derive(Subcommand)]
pub enum OllamaAction {
    /// Test Ollama connection and run sample classifications
    Test {
        /// Classify this description instead of the samples
        #[arg(long)]
        description: Option<String>,

        /// Model name override
        #[arg(long)]
        model: Option<String>,
    },
}
