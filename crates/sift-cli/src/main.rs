//! Sift CLI - Expense categorizer and anomaly detector
//!
//! Usage:
//!   sift run --file ledger.csv             Categorize and flag anomalies
//!   sift classify "UBER *TRIP"             Classify one description
//!   sift rules test "SWIGGY ORDER"         Show the matching rule
//!   sift ollama test                       Check the model server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use sift_core::PromptLibrary;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so reports and exports on stdout stay clean
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Run {
            file,
            output,
            format,
            threshold,
            max_rows,
            quiet,
            model,
        } => {
            let config = commands::load_config(config_path)?;
            let opts = commands::RunOptions {
                output,
                format: format.parse().map_err(|e: String| anyhow::anyhow!(e))?,
                threshold,
                max_rows,
                quiet,
                no_llm: model.no_llm,
                model: model.model,
            };
            commands::cmd_run(config, &file, opts).await
        }
        Commands::Classify { description, model } => {
            let config = commands::load_config(config_path)?;
            commands::cmd_classify(config, &description, model.no_llm, model.model.as_deref())
                .await
        }
        Commands::Rules { action } => {
            let config = commands::load_config(config_path)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&config),
                Some(RulesAction::Test { description }) => {
                    commands::cmd_rules_test(&config, &description)
                }
            }
        }
        Commands::Categories => {
            let config = commands::load_config(config_path)?;
            commands::cmd_categories(&config)
        }
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => {
                let config = commands::load_config(config_path)?;
                commands::cmd_config_show(&config)
            }
            Some(ConfigAction::Path) => commands::cmd_config_path(config_path),
            Some(ConfigAction::Default) => commands::cmd_config_default(),
            Some(ConfigAction::Prompt) => commands::cmd_config_prompt(&PromptLibrary::new()),
        },
        Commands::Ollama { action } => match action {
            OllamaAction::Test { description, model } => {
                let config = commands::load_config(config_path)?;
                commands::cmd_ollama_test(&config, description.as_deref(), model.as_deref()).await
            }
        },
    }
}
