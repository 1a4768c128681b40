//! Model-backed oracle

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::providers::{ChatMessage, CompletionRequest, LlmProvider};
use crate::{Error, Result};

use super::{Decision, DecisionOracle, OracleRequest};

/// Longest slice of one message shown to the model
const MAX_MESSAGE_CHARS: usize = 2000;

/// Asks a chat-completion model for the next step
pub struct LlmOracle {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
}

impl LlmOracle {
    pub fn new(provider: Arc<dyn LlmProvider>, system_prompt: impl Into<String>) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
        }
    }

    fn render(request: &OracleRequest<'_>) -> String {
        let mut out = String::from("Participants:\n");
        for d in request.descriptions {
            let _ = writeln!(out, "- {}: {}", d.name, d.description.trim());
        }
        let _ = writeln!(out, "\nTurns remaining: {}\n\nConversation:", request.remaining_turns);
        for message in request.transcript.messages() {
            let content: String = message.content.chars().take(MAX_MESSAGE_CHARS).collect();
            let _ = writeln!(out, "[{}] {}", message.speaker, content);
        }
        out.push_str("\nWho acts next?");
        out
    }
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn decide(&self, request: &OracleRequest<'_>) -> Result<Decision> {
        let completion = CompletionRequest::new(vec![ChatMessage::user(Self::render(request))])
            .with_system(self.system_prompt.clone());

        let response = self.provider.complete(completion).await?;
        let answer = response
            .content
            .ok_or_else(|| Error::Oracle("model returned no content".to_string()))?;
        debug!(%answer, "oracle answer");

        Decision::from_answer(&answer)
    }
}
