//! Clarification capability, the fallback when no capability fits

use async_trait::async_trait;

use crate::Result;

use super::{Capability, CapabilityProfile, Reply, TurnContext, CLARIFY};

pub const CLARIFICATION: &str = "Please tell me what to investigate: a specific brand name \
(for example `hdfc`) or a GitHub repository URL (for example https://github.com/org/repo).";

/// Asks for a usable target and ends the run without calling any tool
pub struct ClarifyAgent {
    profile: CapabilityProfile,
}

impl ClarifyAgent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            profile: CapabilityProfile::new(CLARIFY, description),
        }
    }
}

#[async_trait]
impl Capability for ClarifyAgent {
    fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    async fn act(&self, _ctx: &TurnContext<'_>) -> Result<Vec<Reply>> {
        Ok(vec![Reply::terminate(CLARIFICATION)])
    }
}
