//! Streaming secret scanner (trufflehog)

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::ScannerConfig;
use crate::tools::executor::{CommandSpec, ToolExecutor};
use crate::tools::{Tool, ToolError, ToolOutput, ToolResult, TRUFFLEHOG};

use super::validate_repository;

/// Key present in every trufflehog result line
pub const PROVENANCE_MARKER: &str = "SourceMetadata";

/// Runs `trufflehog git` and keeps the JSON result lines
pub struct TrufflehogTool {
    executor: Arc<ToolExecutor>,
    binary: String,
    archive_max_depth: u32,
    timeout: std::time::Duration,
}

impl TrufflehogTool {
    pub fn new(executor: Arc<ToolExecutor>, config: &ScannerConfig) -> Self {
        Self {
            executor,
            binary: config.trufflehog.clone(),
            archive_max_depth: config.archive_max_depth,
            timeout: config.timeout(),
        }
    }

    fn command(&self, repository: &str) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .args([
                "git".to_string(),
                repository.to_string(),
                format!("--archive-max-depth={}", self.archive_max_depth),
                "--results=verified,unverified,unknown".to_string(),
                "-j".to_string(),
                "--no-update".to_string(),
            ])
            .timeout(self.timeout)
    }
}

#[async_trait]
impl Tool for TrufflehogTool {
    fn name(&self) -> &str {
        TRUFFLEHOG
    }

    fn description(&self) -> &str {
        "Scan a repository's git history for verified and unverified secrets"
    }

    async fn invoke(&self, input: &str) -> ToolResult {
        let repository = validate_repository(input)?;
        let result = self
            .executor
            .execute(TRUFFLEHOG, self.command(repository))
            .await?;

        // Output from a failed run is not trusted, even the parsable part.
        if !result.success() {
            return Err(ToolError::Exit {
                program: self.binary.clone(),
                code: result.exit_code,
                stderr: result.stderr.trim().to_string(),
            });
        }

        Ok(ToolOutput::Records(parse_stream(&result.stdout)))
    }
}

/// Parse newline-delimited scanner output
///
/// A line becomes a record only when it carries the provenance marker and
/// parses as JSON. Malformed lines are logged and skipped; they never discard
/// records parsed before or after them.
pub fn parse_stream(stdout: &str) -> Vec<Value> {
    let mut records = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || !line.contains(PROVENANCE_MARKER) {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(record) if record.is_object() => records.push(record),
            Ok(_) => warn!(line = idx + 1, "skipping non-object trufflehog line"),
            Err(e) => warn!(line = idx + 1, "skipping malformed trufflehog line: {}", e),
        }
    }
    records
}
