//! Append-only run transcript

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::findings::RepositoryOutcome;
use crate::{Error, Result};

/// Speaker name for the user's request
pub const USER: &str = "user";

/// Speaker name for messages the loop itself appends
pub const ORCHESTRATOR: &str = "orchestrator";

/// How a message affects control flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageKind {
    Normal,
    /// Route the next turn to `target` without asking the oracle
    Handoff { target: String, reason: String },
    /// No further dispatch after this message
    Terminate,
}

/// Structured data carried alongside message text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    /// Resolved repositories, first-seen order
    Repositories(Vec<String>),
    /// One aggregated outcome per scanned repository
    ScanResults(Vec<RepositoryOutcome>),
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub speaker: String,
    pub content: String,
    #[serde(flatten)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(speaker: impl Into<String>, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            speaker: speaker.into(),
            content: content.into(),
            kind,
            payload: None,
            created_at: Utc::now(),
        }
    }

    /// The request that seeds a run
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER, content, MessageKind::Normal)
    }

    pub fn with_payload(mut self, payload: Option<Payload>) -> Self {
        self.payload = payload;
        self
    }

    pub fn is_terminate(&self) -> bool {
        matches!(self.kind, MessageKind::Terminate)
    }

    /// Hand-off target, if this message is a hand-off
    pub fn handoff_target(&self) -> Option<&str> {
        match &self.kind {
            MessageKind::Handoff { target, .. } => Some(target),
            _ => None,
        }
    }
}

/// Ordered, append-only message log of one run
///
/// Once a terminate message is in, every further append fails.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript seeded with the user's request
    pub fn seeded(request: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(request)],
        }
    }

    pub fn append(&mut self, message: Message) -> Result<&Message> {
        if self.is_terminated() {
            return Err(Error::TranscriptClosed);
        }
        self.messages.push(message);
        self.messages.last().ok_or(Error::TranscriptClosed)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.messages.iter().any(Message::is_terminate)
    }

    /// Text of the first user message
    pub fn request(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.speaker == USER)
            .map(|m| m.content.as_str())
    }

    /// Most recently resolved repositories
    pub fn latest_repositories(&self) -> Option<&[String]> {
        self.messages.iter().rev().find_map(|m| match &m.payload {
            Some(Payload::Repositories(repos)) => Some(repos.as_slice()),
            _ => None,
        })
    }

    /// Most recent scan outcomes
    pub fn latest_scan_results(&self) -> Option<&[RepositoryOutcome]> {
        self.messages.iter().rev().find_map(|m| match &m.payload {
            Some(Payload::ScanResults(outcomes)) => Some(outcomes.as_slice()),
            _ => None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_terminate_closes_transcript() {
        let mut transcript = Transcript::seeded("hdfc");
        transcript
            .append(Message::new("report", "done", MessageKind::Terminate))
            .unwrap();

        let result = transcript.append(Message::new("scan", "late", MessageKind::Normal));
        assert!(matches!(result, Err(Error::TranscriptClosed)));
        assert_eq!(transcript.len(), 2);
        assert!(transcript.is_terminated());
    }

    #[test]
    fn test_latest_payloads() {
        let mut transcript = Transcript::seeded("hdfc");
        assert!(transcript.latest_repositories().is_none());

        transcript
            .append(
                Message::new("search", "found one", MessageKind::Normal).with_payload(Some(
                    Payload::Repositories(vec!["https://github.com/a/b".into()]),
                )),
            )
            .unwrap();
        transcript
            .append(Message::new("scan", "nothing yet", MessageKind::Normal))
            .unwrap();

        assert_eq!(
            transcript.latest_repositories().unwrap(),
            ["https://github.com/a/b".to_string()]
        );
        assert!(transcript.latest_scan_results().is_none());
        assert_eq!(transcript.request(), Some("hdfc"));
    }

    #[test]
    fn test_message_serialization() {
        let message = Message::new(
            "scan",
            "HANDOFF",
            MessageKind::Handoff {
                target: "report".into(),
                reason: "no findings".into(),
            },
        );
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["kind"], "handoff");
        assert_eq!(json["target"], "report");
        assert!(json.get("payload").is_none());
        assert_eq!(message.handoff_target(), Some("report"));
    }
}
