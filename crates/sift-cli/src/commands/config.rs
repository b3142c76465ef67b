//! Config command implementations

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::config::{default_config_path, default_config_text};
use sift_core::{Config, PromptId, PromptLibrary};

/// Print the effective configuration
pub fn cmd_config_show(config: &Config) -> Result<()> {
    println!("⚙️  Configuration\n");
    println!(
        "  Source:      {}",
        config
            .source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "embedded defaults".to_string())
    );
    println!("  Categories:  {}", config.categories.len());
    println!("  Rules:       {}", config.rules.len());
    println!("  Max rows:    {}", config.max_rows);

    println!("\n  Model");
    println!("    Backend:     {}", config.ai.backend);
    println!("    Host:        {}", config.ai.host);
    println!("    Model:       {}", config.ai.model);
    println!("    Timeout:     {}s", config.ai.timeout.as_secs());
    println!("    Temperature: {}", config.ai.temperature);

    println!("\n  Anomalies");
    match config.anomaly.effective_threshold() {
        Some(t) => println!("    Manual threshold: {}", t),
        None => println!("    Manual threshold: (off)"),
    }
    println!("    MAD k:            {}", config.anomaly.mad_k);

    Ok(())
}

/// Print where the override file is read from
pub fn cmd_config_path(explicit: Option<&Path>) -> Result<()> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!();
                eprintln!("Note: This file does not exist yet.");
                eprintln!("Run `sift config default > {}` to start one.", path.display());
            }
        }
        None => {
            eprintln!("Could not determine config directory.");
            eprintln!("The data directory is not available on this system.");
        }
    }

    Ok(())
}

/// Print the embedded default config
pub fn cmd_config_default() -> Result<()> {
    print!("{}", default_config_text());
    Ok(())
}

/// Print the classification prompt that `run` and `classify` will use
pub fn cmd_config_prompt(library: &PromptLibrary) -> Result<()> {
    let id = PromptId::ClassifyTransaction;
    let prompt = library
        .get(id)
        .with_context(|| format!("Failed to load prompt {}", id.as_str()))?;

    match &prompt.override_path {
        Some(path) => println!(
            "📝 {} v{} (override: {})",
            id.as_str(),
            prompt.metadata.version,
            path.display()
        ),
        None => println!("📝 {} v{} (embedded)", id.as_str(), prompt.metadata.version),
    }
    if !library.has_override(id) {
        if let Some(dir) = library.override_dir() {
            println!("   Override with {}", dir.join(format!("{}.md", id.as_str())).display());
        }
    }

    println!();
    println!("{}", prompt.content);
    Ok(())
}
