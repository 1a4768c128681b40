//! Network reconnaissance tools
//!
//! Port scan and WHOIS output is handed to the transcript verbatim; nothing
//! here parses it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ReconConfig;

use super::executor::{CommandSpec, ToolExecutor};
use super::{Tool, ToolError, ToolOutput, ToolResult, PORT_SCAN, WHOIS};

/// Runs `nmap` with a raw, whitespace-separated argument string
pub struct PortScanTool {
    executor: Arc<ToolExecutor>,
    binary: String,
    timeout: Duration,
}

impl PortScanTool {
    pub fn new(executor: Arc<ToolExecutor>, config: &ReconConfig) -> Self {
        Self {
            executor,
            binary: config.nmap.clone(),
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl Tool for PortScanTool {
    fn name(&self) -> &str {
        PORT_SCAN
    }

    fn description(&self) -> &str {
        "Run an nmap port scan with the given arguments"
    }

    async fn invoke(&self, input: &str) -> ToolResult {
        let args: Vec<&str> = input.split_whitespace().collect();
        if args.is_empty() {
            return Err(ToolError::InvalidInput("no nmap arguments given".to_string()));
        }

        let result = self
            .executor
            .execute(
                PORT_SCAN,
                CommandSpec::new(&self.binary).args(args).timeout(self.timeout),
            )
            .await?;
        Ok(ToolOutput::Text(result.stdout))
    }
}

/// Runs `whois` for a single domain
pub struct WhoisTool {
    executor: Arc<ToolExecutor>,
    binary: String,
    timeout: Duration,
}

impl WhoisTool {
    pub fn new(executor: Arc<ToolExecutor>, config: &ReconConfig) -> Self {
        Self {
            executor,
            binary: config.whois.clone(),
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl Tool for WhoisTool {
    fn name(&self) -> &str {
        WHOIS
    }

    fn description(&self) -> &str {
        "Look up WHOIS registration data for a domain"
    }

    async fn invoke(&self, input: &str) -> ToolResult {
        let domain = input.trim();
        if domain.is_empty() || domain.starts_with('-') || domain.contains(char::is_whitespace) {
            return Err(ToolError::InvalidInput(format!("not a domain: {:?}", input)));
        }

        let result = self
            .executor
            .execute(
                WHOIS,
                CommandSpec::new(&self.binary).arg(domain).timeout(self.timeout),
            )
            .await?;
        Ok(ToolOutput::Text(result.stdout))
    }
}
