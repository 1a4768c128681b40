//! Console event sink

use leakhunt_core::agents::AgentStatus;
use leakhunt_core::orchestrator::{EventSender, Message, MessageKind};
use leakhunt_core::tools::ToolExecution;
use tracing::debug;

/// Streams transcript messages to stdout as they are appended
#[derive(Debug, Default)]
pub struct ConsoleEvents;

impl ConsoleEvents {
    pub fn render(message: &Message) -> String {
        let marker = match &message.kind {
            MessageKind::Normal => "",
            MessageKind::Handoff { .. } => " (handoff)",
            MessageKind::Terminate => " (final)",
        };
        format!("--- {}{} ---\n{}\n", message.speaker, marker, message.content.trim_end())
    }

    /// One line per process the run started
    pub fn render_execution(execution: &ToolExecution) -> String {
        let status = match (&execution.error, execution.exit_code) {
            (Some(error), _) => format!("failed: {}", error),
            (None, Some(code)) => format!("exit {}", code),
            (None, None) => "unfinished".to_string(),
        };
        let elapsed = execution
            .completed_at
            .map(|done| format!(" in {}ms", (done - execution.started_at).num_milliseconds()))
            .unwrap_or_default();
        format!("{} ({}): {}{}", execution.tool, execution.program, status, elapsed)
    }
}

impl EventSender for ConsoleEvents {
    fn send_message(&self, message: &Message) {
        println!("{}", Self::render(message));
    }

    fn send_status(&self, capability: &str, status: AgentStatus) {
        debug!(capability, ?status, "capability status");
    }
}
