//! Capability trait definitions

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::orchestrator::{MessageKind, Payload, Transcript};
use crate::tools::ToolRef;
use crate::Result;

/// Capability execution status, reported to event listeners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    /// Running tools for the current turn
    Executing,
    Completed,
    Failed,
}

/// Static description of a capability
///
/// Immutable once the capability is registered.
#[derive(Clone)]
pub struct CapabilityProfile {
    pub name: String,
    pub description: String,
    pub tools: Vec<ToolRef>,
    pub can_handoff_to: BTreeSet<String>,
}

impl CapabilityProfile {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            tools: Vec::new(),
            can_handoff_to: BTreeSet::new(),
        }
    }

    pub fn with_tool(mut self, tool: ToolRef) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_handoff(mut self, target: impl Into<String>) -> Self {
        self.can_handoff_to.insert(target.into());
        self
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Look up one of this capability's tools by name
    pub fn tool(&self, name: &str) -> Option<&ToolRef> {
        self.tools.iter().find(|t| t.name() == name)
    }
}

impl std::fmt::Debug for CapabilityProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityProfile")
            .field("name", &self.name)
            .field("tools", &self.tool_names())
            .field("can_handoff_to", &self.can_handoff_to)
            .finish_non_exhaustive()
    }
}

/// What a capability says in one turn
///
/// The loop stamps the speaker and appends it to the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    pub kind: MessageKind,
    pub payload: Option<Payload>,
}

impl Reply {
    pub fn say(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Normal,
            payload: None,
        }
    }

    pub fn handoff(target: impl Into<String>, reason: impl Into<String>) -> Self {
        let target = target.into();
        let reason = reason.into();
        Self {
            content: format!("HANDOFF TO {}: {}", target, reason),
            kind: MessageKind::Handoff { target, reason },
            payload: None,
        }
    }

    pub fn terminate(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: MessageKind::Terminate,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Read-only view of the run handed to a capability
pub struct TurnContext<'a> {
    pub transcript: &'a Transcript,
    pub remaining_turns: u32,
}

impl<'a> TurnContext<'a> {
    pub fn new(transcript: &'a Transcript, remaining_turns: u32) -> Self {
        Self {
            transcript,
            remaining_turns,
        }
    }

    /// The user's original request, trimmed
    pub fn request(&self) -> &str {
        self.transcript.request().unwrap_or_default().trim()
    }
}

/// Core trait for all capabilities
#[async_trait]
pub trait Capability: Send + Sync {
    fn profile(&self) -> &CapabilityProfile;

    fn name(&self) -> &str {
        &self.profile().name
    }

    /// Act on the transcript and return the message(s) to append
    ///
    /// Tool failures are reported inside the replies; an `Err` here ends the
    /// run.
    async fn act(&self, ctx: &TurnContext<'_>) -> Result<Vec<Reply>>;
}
