//! Subprocess execution for scanner and recon tools

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use uuid::Uuid;

use super::ToolError;

/// A fully described process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured output of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs external processes
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecResult, ToolError>;
}

/// Runs processes on the local host with `tokio::process`
///
/// Children are killed when their future is dropped, so a cancelled run
/// never leaves a scanner behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExecResult, ToolError> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|e| ToolError::Spawn {
            program: spec.program.clone(),
            reason: e.to_string(),
        })?;

        match tokio::time::timeout(spec.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(ExecResult {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code().map(i64::from).unwrap_or(-1),
            }),
            Ok(Err(e)) => Err(ToolError::Spawn {
                program: spec.program.clone(),
                reason: e.to_string(),
            }),
            Err(_) => Err(ToolError::Timeout {
                program: spec.program.clone(),
                secs: spec.timeout.as_secs(),
            }),
        }
    }
}

/// Audit record of one process execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExecution {
    pub id: String,
    pub tool: String,
    pub program: String,
    pub args: Vec<String>,
    pub exit_code: Option<i64>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ToolExecution {
    /// Create a new execution record
    pub fn new(tool: impl Into<String>, spec: &CommandSpec) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tool: tool.into(),
            program: spec.program.clone(),
            args: spec.args.clone(),
            exit_code: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record completion
    pub fn complete(&mut self, result: &Result<ExecResult, ToolError>) {
        match result {
            Ok(exec) => self.exit_code = Some(exec.exit_code),
            Err(e) => self.error = Some(e.to_string()),
        }
        self.completed_at = Some(Utc::now());
    }
}

/// Tool executor shared by every process-backed tool
pub struct ToolExecutor {
    runner: Arc<dyn ProcessRunner>,
    executions: Mutex<Vec<ToolExecution>>,
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            runner,
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Executor backed by real local processes
    pub fn system() -> Self {
        Self::new(Arc::new(SystemRunner))
    }

    /// Execute a command on behalf of `tool`
    pub async fn execute(&self, tool: &str, spec: CommandSpec) -> Result<ExecResult, ToolError> {
        let mut execution = ToolExecution::new(tool, &spec);
        tracing::debug!(tool, program = %spec.program, args = ?spec.args, "running tool process");

        let result = self.runner.run(&spec).await;
        execution.complete(&result);

        match &result {
            Ok(exec) => tracing::debug!(tool, exit_code = exec.exit_code, "tool process finished"),
            Err(e) => tracing::warn!(tool, "tool process failed: {}", e),
        }

        self.executions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(execution);

        result
    }

    /// Drain the execution records gathered since the last call
    pub fn take_executions(&self) -> Vec<ToolExecution> {
        std::mem::take(
            &mut *self
                .executions
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::system()
    }
}
