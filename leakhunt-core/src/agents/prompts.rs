//! Capability descriptions and the oracle routing prompt

use serde::Deserialize;
use std::path::Path;

use crate::{Error, Result};

/// Description of one capability
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityPrompt {
    pub description: String,
}

/// System prompt for the model-backed oracle
#[derive(Debug, Clone, Deserialize)]
pub struct OraclePrompt {
    pub prompt: String,
}

/// All capability descriptions plus the oracle prompt
#[derive(Debug, Clone, Deserialize)]
pub struct Prompts {
    pub search: CapabilityPrompt,
    pub scan: CapabilityPrompt,
    pub report: CapabilityPrompt,
    pub recon: CapabilityPrompt,
    pub clarify: CapabilityPrompt,
    pub oracle: OraclePrompt,
}

impl Prompts {
    /// Load prompts from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse prompts from TOML string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse prompts: {}", e)))
    }

    /// Embedded defaults
    #[allow(clippy::expect_used)]
    pub fn default_prompts() -> Self {
        let content = include_str!("../../prompts.toml");
        Self::parse(content).expect("Embedded prompts.toml should be valid")
    }

    /// Description for a capability
    pub fn description(&self, capability: &str) -> Option<&str> {
        match capability {
            super::SEARCH => Some(&self.search.description),
            super::SCAN => Some(&self.scan.description),
            super::REPORT => Some(&self.report.description),
            super::RECON => Some(&self.recon.description),
            super::CLARIFY => Some(&self.clarify.description),
            _ => None,
        }
    }
}

impl Default for Prompts {
    fn default() -> Self {
        Self::default_prompts()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_prompts_parse() {
        let prompts = Prompts::default_prompts();
        assert!(prompts.description("search").unwrap().contains("GitHub"));
        assert!(prompts.description("report").unwrap().contains("severity"));
        assert!(prompts.oracle.prompt.contains("\"terminate\""));
        assert!(prompts.description("exploit").is_none());
    }

    #[test]
    fn test_parse_rejects_missing_sections() {
        let result = Prompts::parse("[search]\ndescription = \"x\"\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
