//! Shared command utilities
//!
//! - `load_config` - Embedded defaults plus override file plus environment
//! - `build_client` - Model client honoring `--no-llm` and `--model`

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::{AIClient, Config};
use tracing::debug;

/// Load configuration, reporting which file (if any) was applied
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = Config::load(path).context("Failed to load configuration")?;
    match &config.source {
        Some(source) => debug!(path = %source.display(), "Loaded config"),
        None => debug!("Using embedded default config"),
    }
    Ok(config)
}

/// Pick the model client for this invocation
pub fn build_client(config: &Config, no_llm: bool, model: Option<&str>) -> Result<AIClient> {
    if no_llm {
        return Ok(AIClient::disabled());
    }

    let client = AIClient::from_config(&config.ai).context("Failed to create model client")?;
    Ok(match model {
        Some(m) => client.with_model(m),
        None => client,
    })
}
