//! Scripted oracle for tests and replays

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Error, Result};

use super::{Decision, DecisionOracle, OracleRequest};

/// Returns a fixed sequence of decisions, one per call
///
/// Running out of decisions is an oracle error, so a test notices when the
/// loop asks more often than expected.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    decisions: Mutex<VecDeque<Result<Decision>>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: Mutex::new(decisions.into_iter().map(Ok).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue an error answer after the current script
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.decisions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(Err(Error::Oracle(message.into())));
        self
    }

    /// Number of times `decide` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(&self, _request: &OracleRequest<'_>) -> Result<Decision> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.decisions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(Error::Oracle("script exhausted".to_string())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::orchestrator::Transcript;

    #[tokio::test]
    async fn test_script_plays_in_order() {
        let oracle = ScriptedOracle::new([Decision::Select("search".into()), Decision::Terminate])
            .then_fail("bad answer");
        let transcript = Transcript::seeded("hdfc");
        let request = OracleRequest {
            transcript: &transcript,
            descriptions: &[],
            remaining_turns: 10,
        };

        assert_eq!(
            oracle.decide(&request).await.unwrap(),
            Decision::Select("search".into())
        );
        assert_eq!(oracle.decide(&request).await.unwrap(), Decision::Terminate);
        assert!(matches!(oracle.decide(&request).await, Err(Error::Oracle(_))));
        assert!(matches!(oracle.decide(&request).await, Err(Error::Oracle(m)) if m == "script exhausted"));
        assert_eq!(oracle.calls(), 4);
    }
}
