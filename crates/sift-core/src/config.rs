//! Layered configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Embedded defaults (compiled into binary from `config/default.toml`)
//! 2. An override file (`--config PATH`, else `~/.local/share/sift/config.toml`)
//!
//! `categories` and `rules` in the override replace the defaults wholesale;
//! `[ai]`, `[anomaly]` and `[pipeline]` are merged field by field, so an
//! override only needs the keys it changes.
//! Environment variables (`AI_BACKEND`, `OLLAMA_HOST`, `OLLAMA_MODEL`) are
//! applied last.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::CategorySet;
use crate::rules::{MerchantRule, RuleTable};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Which classification backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Ollama HTTP API
    Ollama,
    /// No model; every rule miss gets the disabled default
    Disabled,
    /// In-process mock for tests and demos
    Mock,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Disabled => "disabled",
            Self::Mock => "mock",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "disabled" | "none" | "off" => Ok(Self::Disabled),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown AI backend: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification backend settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub backend: BackendKind,
    pub host: String,
    pub model: String,
    /// Per-call timeout; no retries are attempted
    pub timeout: Duration,
    pub temperature: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Ollama,
            host: "http://localhost:11434".to_string(),
            model: "llama3.1:8b".to_string(),
            timeout: Duration::from_secs(90),
            temperature: 0.0,
        }
    }
}

/// Anomaly detection settings
#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyConfig {
    /// Flag amounts strictly above this value; `None` skips the check
    pub manual_threshold: Option<f64>,
    /// Robust-outlier sensitivity (threshold = median + k * MAD)
    pub mad_k: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            manual_threshold: None,
            mad_k: crate::stats::DEFAULT_MAD_K,
        }
    }
}

impl AnomalyConfig {
    /// Manual threshold, only when positive
    pub fn effective_threshold(&self) -> Option<f64> {
        self.manual_threshold.filter(|t| t.is_finite() && *t > 0.0)
    }
}

/// Full runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub categories: CategorySet,
    pub rules: RuleTable,
    pub ai: AiConfig,
    pub anomaly: AnomalyConfig,
    /// Cap on valid rows processed per run
    pub max_rows: usize,
    /// Override file that was applied, if any
    pub source: Option<PathBuf>,
}

impl Config {
    /// The embedded defaults only
    pub fn embedded() -> Result<Self> {
        let raw = parse_raw(DEFAULT_CONFIG)?;
        let mut config = Config {
            categories: CategorySet::default(),
            rules: RuleTable::new(),
            ai: AiConfig::default(),
            anomaly: AnomalyConfig::default(),
            max_rows: 2000,
            source: None,
        };
        config.apply(raw)?;
        Ok(config)
    }

    /// Embedded defaults plus the override file (if it exists) plus environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::embedded()?;

        let path = match override_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        if let Some(path) = path {
            if path.exists() {
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                config.apply(parse_raw(&content)?)?;
                debug!(path = %path.display(), "Applied config override");
                config.source = Some(path);
            } else if override_path.is_some() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config from TOML text layered over the embedded defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config = Self::embedded()?;
        config.apply(parse_raw(content)?)?;
        Ok(config)
    }

    /// Apply `AI_BACKEND`, `OLLAMA_HOST` and `OLLAMA_MODEL`
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = get("AI_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.ai.backend = kind,
                Err(e) => warn!("{}; keeping {}", e, self.ai.backend),
            }
        }
        if let Some(host) = get("OLLAMA_HOST").filter(|h| !h.trim().is_empty()) {
            self.ai.host = host.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = get("OLLAMA_MODEL").filter(|m| !m.trim().is_empty()) {
            self.ai.model = model.trim().to_string();
        }
    }

    fn apply(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(categories) = raw.categories {
            self.categories = CategorySet::from_names(categories);
        }

        if let Some(rules) = raw.rules {
            self.rules = RuleTable::from(rules);
        }

        if let Some(ai) = raw.ai {
            if let Some(backend) = ai.backend {
                self.ai.backend = backend.parse().map_err(Error::Config)?;
            }
            if let Some(host) = ai.host {
                self.ai.host = host.trim_end_matches('/').to_string();
            }
            if let Some(model) = ai.model {
                self.ai.model = model;
            }
            if let Some(secs) = ai.timeout_secs {
                if secs == 0 {
                    return Err(Error::Config("ai.timeout_secs must be positive".into()));
                }
                self.ai.timeout = Duration::from_secs(secs);
            }
            if let Some(temperature) = ai.temperature {
                self.ai.temperature = temperature;
            }
        }

        if let Some(anomaly) = raw.anomaly {
            if let Some(threshold) = anomaly.manual_threshold {
                self.anomaly.manual_threshold = Some(threshold);
            }
            if let Some(k) = anomaly.mad_k {
                if !(k.is_finite() && k > 0.0) {
                    return Err(Error::Config(format!(
                        "anomaly.mad_k must be a positive number, got {}",
                        k
                    )));
                }
                self.anomaly.mad_k = k;
            }
        }

        if let Some(pipeline) = raw.pipeline {
            if let Some(max_rows) = pipeline.max_rows {
                self.max_rows = max_rows;
            }
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config.toml"))
}

/// The embedded default config text
pub fn default_config_text() -> &'static str {
    DEFAULT_CONFIG
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    categories: Option<Vec<String>>,
    rules: Option<Vec<MerchantRule>>,
    ai: Option<RawAi>,
    anomaly: Option<RawAnomaly>,
    pipeline: Option<RawPipeline>,
}

#[derive(Debug, Deserialize)]
struct RawAi {
    backend: Option<String>,
    host: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    temperature: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAnomaly {
    manual_threshold: Option<f64>,
    mad_k: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    max_rows: Option<usize>,
}

fn parse_raw(content: &str) -> Result<RawConfig> {
    toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = Config::embedded().unwrap();
        assert_eq!(config.categories.len(), 18);
        assert!(config.categories.contains("Other"));
        assert_eq!(config.rules.iter().next().unwrap().keyword, "UBER");
        assert_eq!(config.ai.backend, BackendKind::Ollama);
        assert_eq!(config.ai.model, "llama3.1:8b");
        assert_eq!(config.ai.timeout, Duration::from_secs(90));
        assert_eq!(config.anomaly.mad_k, 4.0);
        assert_eq!(config.anomaly.manual_threshold, None);
        assert_eq!(config.max_rows, 2000);
    }

    #[test]
    fn test_override_replaces_sections() {
        let config = Config::from_toml_str(
            r#"
categories = ["Rent", "Meals"]

[[rules]]
keyword = "landlord"
category = "Rent"

[anomaly]
manual_threshold = 1000.0
"#,
        )
        .unwrap();

        assert_eq!(config.categories.names(), &["Rent", "Meals", "Other"]);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules.iter().next().unwrap().keyword, "LANDLORD");
        assert_eq!(config.anomaly.effective_threshold(), Some(1000.0));
        // Untouched sections keep defaults
        assert_eq!(config.ai.model, "llama3.1:8b");
        assert_eq!(config.anomaly.mad_k, 4.0);
    }

    #[test]
    fn test_ai_section_merges_fields() {
        let config = Config::from_toml_str(
            r#"
[ai]
model = "qwen2.5:7b"
"#,
        )
        .unwrap();

        let defaults = AiConfig::default();
        assert_eq!(config.ai.model, "qwen2.5:7b");
        assert_eq!(config.ai.host, defaults.host);
        assert_eq!(config.ai.timeout, defaults.timeout);
        assert_eq!(config.ai.backend, BackendKind::Ollama);
    }

    #[test]
    fn test_non_positive_threshold_is_ignored() {
        let config = Config::from_toml_str("[anomaly]\nmanual_threshold = 0.0\n").unwrap();
        assert_eq!(config.anomaly.effective_threshold(), None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Config::from_toml_str("[anomaly]\nmad_k = -1.0\n").is_err());
        assert!(Config::from_toml_str("[ai]\ntimeout_secs = 0\n").is_err());
        assert!(Config::from_toml_str("[ai]\nbackend = \"cloud\"\n").is_err());
        assert!(Config::from_toml_str("unknown_key = 1\n").is_err());
        assert!(Config::from_toml_str("categories = ").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::embedded().unwrap();
        let env: HashMap<&str, &str> = [
            ("AI_BACKEND", "disabled"),
            ("OLLAMA_HOST", "http://gpu-box:11434/"),
            ("OLLAMA_MODEL", "gemma3"),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.ai.backend, BackendKind::Disabled);
        assert_eq!(config.ai.host, "http://gpu-box:11434");
        assert_eq!(config.ai.model, "gemma3");
    }

    #[test]
    fn test_unknown_env_backend_keeps_current() {
        let mut config = Config::embedded().unwrap();
        config.apply_env(|k| (k == "AI_BACKEND").then(|| "quantum".to_string()));
        assert_eq!(config.ai.backend, BackendKind::Ollama);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline]\nmax_rows = 50").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.max_rows, 50);
        assert_eq!(config.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_load_missing_explicit_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("Ollama".parse::<BackendKind>(), Ok(BackendKind::Ollama));
        assert_eq!("off".parse::<BackendKind>(), Ok(BackendKind::Disabled));
        assert_eq!("mock".parse::<BackendKind>(), Ok(BackendKind::Mock));
        assert!("cloud".parse::<BackendKind>().is_err());
    }
}
