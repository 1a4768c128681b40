//! Tool invocation layer
//!
//! Every external operation (HTTP search, scanner processes, recon probes)
//! sits behind the [`Tool`] trait and reports failure as a [`ToolError`]
//! value. Nothing in this module returns a crate-level [`Error`](crate::Error).

pub mod executor;
pub mod recon;
pub mod search;
pub mod secrets;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use executor::{CommandSpec, ExecResult, ProcessRunner, SystemRunner, ToolExecution, ToolExecutor};
pub use recon::{PortScanTool, WhoisTool};
pub use search::{extract_repositories, CodeSearchTool};
pub use secrets::{GitleaksTool, TrufflehogTool};

/// Registered tool names
pub const CODE_SEARCH: &str = "search_code";
pub const TRUFFLEHOG: &str = "trufflehog";
pub const GITLEAKS: &str = "gitleaks";
pub const PORT_SCAN: &str = "port_scan";
pub const WHOIS: &str = "whois_lookup";

/// Errors from a single tool invocation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("search API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} exited with code {code}: {stderr}")]
    Exit {
        program: String,
        code: i64,
        stderr: String,
    },

    #[error("{program} timed out after {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("workspace error: {0}")]
    Workspace(String),

    #[error("scanner report missing: {0}")]
    MissingReport(String),

    #[error("unparseable tool output: {0}")]
    Parse(String),

    #[error("invalid tool input: {0}")]
    InvalidInput(String),
}

/// Successful tool output
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// Repository URLs in first-seen order
    Repositories(Vec<String>),
    /// Raw scanner records, untouched
    Records(Vec<Value>),
    /// Free text consumed as-is
    Text(String),
}

impl ToolOutput {
    /// Number of items carried (lines of text count as one)
    pub fn len(&self) -> usize {
        match self {
            Self::Repositories(repos) => repos.len(),
            Self::Records(records) => records.len(),
            Self::Text(text) => usize::from(!text.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of one tool invocation
pub type ToolResult = std::result::Result<ToolOutput, ToolError>;

/// A single externally-facing operation
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable tool name
    fn name(&self) -> &str;

    /// One-line description shown to the oracle
    fn description(&self) -> &str;

    /// Run the tool against one input
    async fn invoke(&self, input: &str) -> ToolResult;
}

/// Shared handle to a tool
pub type ToolRef = Arc<dyn Tool>;
