//! Repository resolution capability

use async_trait::async_trait;
use tracing::{debug, info};

use crate::orchestrator::Payload;
use crate::tools::search::brand_query;
use crate::tools::{ToolOutput, ToolRef, CODE_SEARCH};
use crate::{Error, Result};

use super::request::{classify, RequestKind};
use super::{Capability, CapabilityProfile, Reply, TurnContext, REPORT, SCAN, SEARCH};

/// Reason given when code search comes back empty
pub const NO_RESULTS: &str = "No GitHub results found for this query";

/// Turns the request into a list of repositories
///
/// A repository URL is handed straight to `scan`; a brand or domain is
/// searched for next to credential markers.
pub struct SearchAgent {
    profile: CapabilityProfile,
    query_terms: Vec<String>,
}

impl SearchAgent {
    pub fn new(search: ToolRef, description: impl Into<String>, query_terms: Vec<String>) -> Self {
        Self {
            profile: CapabilityProfile::new(SEARCH, description)
                .with_tool(search)
                .with_handoff(SCAN)
                .with_handoff(REPORT),
            query_terms,
        }
    }

    async fn search(&self, term: &str) -> Result<Reply> {
        let tool = self
            .profile
            .tool(CODE_SEARCH)
            .ok_or_else(|| Error::Agent(format!("{} has no {} tool", SEARCH, CODE_SEARCH)))?;

        let query = brand_query(term, &self.query_terms);
        debug!(%query, "resolving request with code search");

        let reply = match tool.invoke(&query).await {
            Ok(ToolOutput::Repositories(repos)) if !repos.is_empty() => {
                info!(count = repos.len(), "code search resolved repositories");
                let mut content = format!("Found {} repositories for `{}`:", repos.len(), query);
                for repo in &repos {
                    content.push_str("\n- ");
                    content.push_str(repo);
                }
                Reply::say(content).with_payload(Payload::Repositories(repos))
            }
            Ok(_) => Reply::handoff(REPORT, NO_RESULTS),
            Err(e) => Reply::handoff(REPORT, format!("{} ({})", NO_RESULTS, e)),
        };
        Ok(reply)
    }
}

#[async_trait]
impl Capability for SearchAgent {
    fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    async fn act(&self, ctx: &TurnContext<'_>) -> Result<Vec<Reply>> {
        let reply = match classify(ctx.request()) {
            RequestKind::Repository(url) => {
                Reply::handoff(SCAN, "Repository reference given directly, no search needed")
                    .with_payload(Payload::Repositories(vec![url]))
            }
            RequestKind::Brand(term) | RequestKind::Domain(term) => self.search(&term).await?,
            RequestKind::Unclear => Reply::terminate(
                "I need a specific brand name or a GitHub repository URL to search for.",
            ),
        };
        Ok(vec![reply])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::orchestrator::{MessageKind, Transcript};
    use crate::tools::{Tool, ToolError, ToolResult};
    use std::sync::{Arc, Mutex};

    struct CannedSearch {
        result: ToolResult,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Tool for CannedSearch {
        fn name(&self) -> &str {
            CODE_SEARCH
        }

        fn description(&self) -> &str {
            "canned"
        }

        async fn invoke(&self, input: &str) -> ToolResult {
            self.queries.lock().unwrap().push(input.to_string());
            self.result.clone()
        }
    }

    fn agent(result: ToolResult) -> (SearchAgent, Arc<CannedSearch>) {
        let tool = Arc::new(CannedSearch {
            result,
            queries: Mutex::new(Vec::new()),
        });
        let agent = SearchAgent::new(tool.clone(), "search", vec!["password=".to_string()]);
        (agent, tool)
    }

    async fn act(agent: &SearchAgent, request: &str) -> Reply {
        let transcript = Transcript::seeded(request);
        let ctx = TurnContext::new(&transcript, 9);
        agent.act(&ctx).await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_repository_url_short_circuits() {
        let (agent, tool) = agent(Ok(ToolOutput::Repositories(vec![])));

        let reply = act(&agent, "https://github.com/acme/bank").await;

        assert!(tool.queries.lock().unwrap().is_empty());
        assert_eq!(
            reply.kind,
            MessageKind::Handoff {
                target: SCAN.into(),
                reason: "Repository reference given directly, no search needed".into(),
            }
        );
        assert_eq!(
            reply.payload,
            Some(Payload::Repositories(vec!["https://github.com/acme/bank".into()]))
        );
    }

    #[tokio::test]
    async fn test_brand_is_searched() {
        let repos = vec!["https://github.com/acme/bank".to_string()];
        let (agent, tool) = agent(Ok(ToolOutput::Repositories(repos.clone())));

        let reply = act(&agent, "hdfc").await;

        assert_eq!(
            tool.queries.lock().unwrap().as_slice(),
            ["hdfc AND (password=)".to_string()]
        );
        assert_eq!(reply.kind, MessageKind::Normal);
        assert_eq!(reply.payload, Some(Payload::Repositories(repos)));
        assert!(reply.content.contains("https://github.com/acme/bank"));
    }

    #[tokio::test]
    async fn test_empty_search_hands_off_to_report() {
        let (agent, _) = agent(Ok(ToolOutput::Repositories(vec![])));

        let reply = act(&agent, "hdfc").await;
        assert_eq!(
            reply.kind,
            MessageKind::Handoff {
                target: REPORT.into(),
                reason: NO_RESULTS.into(),
            }
        );
    }

    #[tokio::test]
    async fn test_search_error_hands_off_with_reason() {
        let (agent, _) = agent(Err(ToolError::Status {
            status: 401,
            body: "Bad credentials".into(),
        }));

        let reply = act(&agent, "hdfc").await;
        match reply.kind {
            MessageKind::Handoff { target, reason } => {
                assert_eq!(target, REPORT);
                assert!(reason.starts_with(NO_RESULTS));
                assert!(reason.contains("401"));
            }
            other => panic!("expected hand-off, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_greeting_asks_for_target() {
        let (agent, tool) = agent(Ok(ToolOutput::Repositories(vec![])));

        let reply = act(&agent, "hi").await;
        assert_eq!(reply.kind, MessageKind::Terminate);
        assert!(tool.queries.lock().unwrap().is_empty());
    }
}
