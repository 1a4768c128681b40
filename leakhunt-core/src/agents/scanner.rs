//! Secret scanning capability

use async_trait::async_trait;
use futures::future::join_all;
use tracing::info;

use crate::findings::{aggregate, RepositoryOutcome};
use crate::orchestrator::Payload;
use crate::tools::ToolRef;
use crate::Result;

use super::{Capability, CapabilityProfile, Reply, TurnContext, REPORT, SCAN, SEARCH};

/// Runs every secret scanner against every resolved repository
///
/// The scanners for one repository run concurrently and are joined before
/// the next repository starts. Results keep the scanner registration order,
/// so the transcript does not depend on which process finishes first.
pub struct ScanAgent {
    profile: CapabilityProfile,
}

impl ScanAgent {
    pub fn new(scanners: Vec<ToolRef>, description: impl Into<String>) -> Self {
        let profile = scanners.into_iter().fold(
            CapabilityProfile::new(SCAN, description)
                .with_handoff(REPORT)
                .with_handoff(SEARCH),
            CapabilityProfile::with_tool,
        );
        Self { profile }
    }

    async fn scan_repository(&self, repository: &str) -> RepositoryOutcome {
        let results = join_all(self.profile.tools.iter().map(|tool| async move {
            (tool.name().to_string(), tool.invoke(repository).await)
        }))
        .await;
        aggregate(repository, results)
    }
}

#[async_trait]
impl Capability for ScanAgent {
    fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    async fn act(&self, ctx: &TurnContext<'_>) -> Result<Vec<Reply>> {
        let repositories = match ctx.transcript.latest_repositories() {
            Some(repos) if !repos.is_empty() => repos,
            _ => {
                return Ok(vec![Reply::handoff(
                    SEARCH,
                    "No repository has been resolved yet",
                )])
            }
        };

        let mut outcomes = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let outcome = self.scan_repository(repository).await;
            info!(
                %repository,
                findings = outcome.findings().len(),
                tool_errors = outcome.tool_errors().len(),
                "repository scanned"
            );
            outcomes.push(outcome);
        }

        let content = describe(&outcomes);
        let reply = if outcomes.iter().any(RepositoryOutcome::has_findings) {
            Reply::say(content)
        } else {
            let reason = format!("No secrets found in {} scanned repositories", outcomes.len());
            Reply {
                content: format!("{}\nHANDOFF TO {}: {}", content, REPORT, reason),
                ..Reply::handoff(REPORT, reason)
            }
        };
        Ok(vec![reply.with_payload(Payload::ScanResults(outcomes))])
    }
}

fn describe(outcomes: &[RepositoryOutcome]) -> String {
    let mut lines = Vec::new();
    for outcome in outcomes {
        match outcome {
            RepositoryOutcome::NoFindings { repository, .. } => {
                lines.push(format!("{}: no findings", repository));
            }
            RepositoryOutcome::Findings {
                repository,
                findings,
                ..
            } => {
                lines.push(format!("{}: {} finding(s)", repository, findings.len()));
                for finding in findings {
                    lines.push(format!(
                        "  - [{}] {} at {} ({}, {})",
                        finding.severity,
                        finding.secret_kind.as_deref().unwrap_or("secret"),
                        finding.location(),
                        finding.source_tool,
                        finding.verification_status
                    ));
                }
            }
        }
        for failure in outcome.tool_errors() {
            lines.push(format!("  ! {} failed: {}", failure.tool, failure.reason));
        }
    }
    lines.join("\n")
}
