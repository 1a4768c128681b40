//! Decision oracles
//!
//! An oracle looks at the transcript and the registered capabilities and
//! names what happens next. The loop treats it as a black box; the rule table
//! and the scripted double are deterministic, the model-backed oracle is not.

pub mod llm;
pub mod rules;
pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::agents::{CapabilityDescription, Prompts};
use crate::config::{LeakhuntConfig, OracleKind};
use crate::orchestrator::Transcript;
use crate::providers::AzureProvider;
use crate::{Error, Result};

pub use llm::LlmOracle;
pub use rules::RuleOracle;
pub use scripted::ScriptedOracle;

/// What the oracle wants to happen next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Dispatch the named capability
    Select(String),
    /// Route control from one capability to another
    Handoff {
        from: String,
        to: String,
        reason: String,
    },
    /// End the run cleanly
    Terminate,
    /// No capability fits; the loop falls back to clarification
    Undecided,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
enum Answer {
    Select(String),
    Handoff {
        from: String,
        to: String,
        #[serde(default)]
        reason: String,
    },
    Terminate,
}

impl Decision {
    /// Parse a model answer
    ///
    /// Accepts `{"select": name}`, `{"handoff": {"from", "to", "reason"}}` or
    /// `"terminate"`, optionally inside a Markdown code fence. Anything else is
    /// an oracle contract violation.
    pub fn from_answer(answer: &str) -> Result<Self> {
        let body = strip_code_fence(answer);
        let parsed: Answer = serde_json::from_str(body)
            .map_err(|e| Error::Oracle(format!("unparseable answer {:?}: {}", answer.trim(), e)))?;

        Ok(match parsed {
            Answer::Select(name) if !name.trim().is_empty() => {
                Decision::Select(name.trim().to_string())
            }
            Answer::Select(_) => {
                return Err(Error::Oracle("select names no capability".to_string()));
            }
            Answer::Handoff { from, to, reason } => Decision::Handoff { from, to, reason },
            Answer::Terminate => Decision::Terminate,
        })
    }
}

fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Input to one oracle call
#[derive(Debug, Clone, Copy)]
pub struct OracleRequest<'a> {
    pub transcript: &'a Transcript,
    pub descriptions: &'a [CapabilityDescription],
    pub remaining_turns: u32,
}

/// Chooses the next step of a run
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    fn name(&self) -> &str;

    async fn decide(&self, request: &OracleRequest<'_>) -> Result<Decision>;
}

/// Build the oracle selected in configuration
pub fn from_config(config: &LeakhuntConfig, prompts: &Prompts) -> Result<Arc<dyn DecisionOracle>> {
    match config.oracle.kind {
        OracleKind::Rules => Ok(Arc::new(RuleOracle::new())),
        OracleKind::Llm => {
            let provider = AzureProvider::from_config(&config.provider)?;
            Ok(Arc::new(LlmOracle::new(
                Arc::new(provider),
                prompts.oracle.prompt.clone(),
            )))
        }
    }
}
