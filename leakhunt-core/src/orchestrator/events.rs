//! Run event sink

use crate::agents::AgentStatus;

use super::transcript::Message;

/// Receives run progress as it happens (implemented by the CLI)
pub trait EventSender: Send + Sync {
    /// A message was appended to the transcript
    fn send_message(&self, message: &Message);
    /// A capability changed status
    fn send_status(&self, capability: &str, status: AgentStatus);
}

/// Sink that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl EventSender for NoopEvents {
    fn send_message(&self, _message: &Message) {}

    fn send_status(&self, _capability: &str, _status: AgentStatus) {}
}
