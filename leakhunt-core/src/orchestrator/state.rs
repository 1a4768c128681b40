//! Per-run loop state

use serde::{Deserialize, Serialize};

use super::transcript::Transcript;

/// Where the loop is between steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    #[default]
    AwaitingSelection,
    Dispatching,
    Terminated,
}

/// A hand-off waiting to be honored on the next selection step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingHandoff {
    pub from: String,
    pub to: String,
    pub reason: String,
}

/// Mutable state of one run, owned by the loop
#[derive(Debug)]
pub struct RunState {
    pub transcript: Transcript,
    pub turn_count: u32,
    pub active_capability: Option<String>,
    pub pending_handoff: Option<PendingHandoff>,
    pub phase: LoopPhase,
}

impl RunState {
    /// Fresh state seeded with the user's request
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::seeded(request),
            turn_count: 0,
            active_capability: None,
            pending_handoff: None,
            phase: LoopPhase::AwaitingSelection,
        }
    }

    pub fn remaining_turns(&self, max_turns: u32) -> u32 {
        max_turns.saturating_sub(self.turn_count)
    }

    pub fn is_terminated(&self) -> bool {
        self.phase == LoopPhase::Terminated || self.transcript.is_terminated()
    }
}
