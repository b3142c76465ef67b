//! Classification prompt templates
//!
//! A prompt file is YAML frontmatter (`id`, `version`) followed by the
//! template body. `<id>.md` in the override directory
//! (~/.local/share/sift/prompts/overrides/) replaces the compiled-in copy.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Compiled-in templates
mod defaults {
    pub const CLASSIFY_TRANSACTION: &str =
        include_str!("../../../prompts/classify_transaction.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Pick one category for a transaction description
    ClassifyTransaction,
}

impl PromptId {
    /// File stem of the override
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyTransaction => "classify_transaction",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::ClassifyTransaction]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ClassifyTransaction => defaults::CLASSIFY_TRANSACTION,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Bumped whenever the template wording changes
    pub version: u32,
}

/// A resolved template
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub content: String,
    /// Loaded from the override directory
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    /// Render the prompt with `{{var}}` placeholders replaced
    ///
    /// One left-to-right pass over the template: substituted values are
    /// never rescanned, and unknown placeholders are kept as written.
    pub fn render(&self, vars: &HashMap<&str, &str>) -> String {
        let mut result = String::with_capacity(self.content.len());
        let mut rest = self.content.as_str();

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key.trim()) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
        result
    }
}

/// Resolves templates, override first
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
}

impl PromptLibrary {
    /// Overrides from [`default_prompts_dir`]
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
        }
    }

    /// Ignore overrides entirely
    pub fn embedded_only() -> Self {
        Self { override_dir: None }
    }

    pub fn get(&self, id: PromptId) -> Result<Prompt> {
        if let Some(override_path) = self.override_path(id) {
            if override_path.exists() {
                let content = fs::read_to_string(&override_path).map_err(|e| {
                    Error::InvalidData(format!("Could not read {}: {}", override_path.display(), e))
                })?;
                let (metadata, body) = parse_prompt(&content)?;
                return Ok(Prompt {
                    metadata,
                    content: body,
                    is_override: true,
                    override_path: Some(override_path),
                });
            }
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// `<data_local_dir>/sift/prompts/overrides`
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("prompts").join("overrides"))
}

/// Split `---` frontmatter from the body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    if !content.starts_with("---") {
        return Err(Error::InvalidData(
            "Prompt file has no leading --- frontmatter".into(),
        ));
    }

    let rest = &content[3..];
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter is missing its closing ---".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Bad prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}
