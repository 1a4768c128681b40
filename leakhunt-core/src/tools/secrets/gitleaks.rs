//! Clone-then-scan secret scanner (gitleaks)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use tracing::debug;

use crate::config::ScannerConfig;
use crate::tools::executor::{CommandSpec, ToolExecutor};
use crate::tools::{Tool, ToolError, ToolOutput, ToolResult, GITLEAKS};

use super::validate_repository;

/// Report file name inside each scan workspace
pub const REPORT_FILE: &str = "gitleaks_report.json";

/// gitleaks exits 1 when it found leaks; that is a successful scan
const LEAKS_FOUND_EXIT_CODE: i64 = 1;

/// Clones a repository into a private workspace and runs `gitleaks git`
///
/// The workspace is a [`TempDir`] owned by the invocation future, so it is
/// removed on success, on failure, and when the future is dropped mid-scan.
pub struct GitleaksTool {
    executor: Arc<ToolExecutor>,
    git: String,
    binary: String,
    timeout: Duration,
    workspace_root: Option<PathBuf>,
}

impl GitleaksTool {
    pub fn new(executor: Arc<ToolExecutor>, config: &ScannerConfig) -> Self {
        Self {
            executor,
            git: config.git.clone(),
            binary: config.gitleaks.clone(),
            timeout: config.timeout(),
            workspace_root: config.workspace_root.clone(),
        }
    }

    fn create_workspace(&self) -> Result<TempDir, ToolError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("leakhunt-");
        let workspace = match &self.workspace_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        workspace.map_err(|e| ToolError::Workspace(e.to_string()))
    }

    async fn clone_and_scan(&self, repository: &str, workspace: &TempDir) -> ToolResult {
        let checkout = workspace.path().join("repo");
        let report = workspace.path().join(REPORT_FILE);

        let clone = self
            .executor
            .execute(
                GITLEAKS,
                CommandSpec::new(&self.git)
                    .args(["clone", "--quiet", "--", repository])
                    .arg(checkout.to_string_lossy())
                    .timeout(self.timeout),
            )
            .await?;
        if !clone.success() {
            return Err(ToolError::Exit {
                program: format!("{} clone", self.git),
                code: clone.exit_code,
                stderr: clone.stderr.trim().to_string(),
            });
        }

        let scan = self
            .executor
            .execute(
                GITLEAKS,
                CommandSpec::new(&self.binary)
                    .arg("git")
                    .arg(checkout.to_string_lossy())
                    .args(["--report-format", "json", "--report-path"])
                    .arg(report.to_string_lossy())
                    .timeout(self.timeout),
            )
            .await?;
        if !scan.success() && scan.exit_code != LEAKS_FOUND_EXIT_CODE {
            return Err(ToolError::Exit {
                program: self.binary.clone(),
                code: scan.exit_code,
                stderr: scan.stderr.trim().to_string(),
            });
        }

        let content = match tokio::fs::read_to_string(&report).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::MissingReport(format!(
                    "{} reported success but wrote no {}",
                    self.binary, REPORT_FILE
                )));
            }
            Err(e) => return Err(ToolError::Workspace(e.to_string())),
        };

        parse_report(&content).map(ToolOutput::Records)
    }
}

#[async_trait]
impl Tool for GitleaksTool {
    fn name(&self) -> &str {
        GITLEAKS
    }

    fn description(&self) -> &str {
        "Clone a repository and scan its history for hard-coded secrets"
    }

    async fn invoke(&self, input: &str) -> ToolResult {
        let repository = validate_repository(input)?;
        let workspace = self.create_workspace()?;
        debug!(workspace = %workspace.path().display(), %repository, "gitleaks workspace created");

        let result = self.clone_and_scan(repository, &workspace).await;

        if let Err(e) = workspace.close() {
            tracing::warn!("failed to remove gitleaks workspace: {}", e);
        }
        result
    }
}

/// Parse a whole-file gitleaks JSON report
fn parse_report(content: &str) -> Result<Vec<Value>, ToolError> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<Value>>(content).map_err(|e| ToolError::Parse(e.to_string()))
}
