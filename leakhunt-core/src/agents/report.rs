//! Findings summary capability

use std::fmt::Write as _;

use async_trait::async_trait;

use crate::findings::{FindingRecord, RepositoryOutcome, ToolFailure, VerificationStatus};
use crate::orchestrator::{MessageKind, Transcript};
use crate::Result;

use super::{Capability, CapabilityProfile, Reply, TurnContext, REPORT, SCAN};

/// Opening of every report that found nothing
pub const NO_SENSITIVE_INFORMATION: &str = "No sensitive information was found";

/// Writes the final summary and ends the run
pub struct ReportAgent {
    profile: CapabilityProfile,
}

impl ReportAgent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            profile: CapabilityProfile::new(REPORT, description).with_handoff(SCAN),
        }
    }
}

#[async_trait]
impl Capability for ReportAgent {
    fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    async fn act(&self, ctx: &TurnContext<'_>) -> Result<Vec<Reply>> {
        if let Some(outcomes) = ctx.transcript.latest_scan_results() {
            return Ok(vec![Reply::terminate(render_report(outcomes))]);
        }
        if let Some(reason) = handoff_reason(ctx.transcript) {
            return Ok(vec![Reply::terminate(format!(
                "{}. {}.",
                NO_SENSITIVE_INFORMATION,
                reason.trim_end_matches('.')
            ))]);
        }
        Ok(vec![Reply::handoff(SCAN, "No scan results to summarize yet")])
    }
}

/// Reason of the hand-off that routed control here, if any
fn handoff_reason(transcript: &Transcript) -> Option<&str> {
    match transcript.last().map(|m| &m.kind) {
        Some(MessageKind::Handoff { target, reason }) if target == REPORT => Some(reason),
        _ => None,
    }
}

fn recommended_action(finding: &FindingRecord) -> &'static str {
    match finding.verification_status {
        VerificationStatus::Verified => {
            "Revoke and rotate this credential now, it is live. Review access logs for misuse, \
             then purge it from git history."
        }
        VerificationStatus::Unverified | VerificationStatus::Unknown => {
            "Rotate the credential, remove it from the file and purge it from git history \
             (git filter-repo or BFG). Contact the repository owner if it is not yours."
        }
    }
}

/// Render the structured summary for a set of scan outcomes
pub fn render_report(outcomes: &[RepositoryOutcome]) -> String {
    let mut findings: Vec<&FindingRecord> =
        outcomes.iter().flat_map(|o| o.findings().iter()).collect();
    findings.sort_by_key(|f| f.severity);

    let clean: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.has_findings())
        .map(RepositoryOutcome::repository)
        .collect();
    let failures: Vec<(&str, &ToolFailure)> = outcomes
        .iter()
        .flat_map(|o| o.tool_errors().iter().map(move |f| (o.repository(), f)))
        .collect();

    let mut out = String::from("# Secret exposure report\n\n");

    if findings.is_empty() {
        let _ = writeln!(
            out,
            "{} in {} scanned repositories.",
            NO_SENSITIVE_INFORMATION,
            outcomes.len()
        );
    } else {
        let _ = writeln!(
            out,
            "Scanned {} repositories, {} finding(s).\n",
            outcomes.len(),
            findings.len()
        );
        out.push_str("## Findings\n");
        for (i, finding) in findings.iter().enumerate() {
            let _ = writeln!(
                out,
                "\n{}. [{}] {} ({}) in {}",
                i + 1,
                finding.severity.to_string().to_uppercase(),
                finding.secret_kind.as_deref().unwrap_or("Secret"),
                finding.verification_status,
                finding.repository
            );
            let _ = writeln!(out, "   - Where: {}", finding.location());
            let _ = writeln!(out, "   - Found by: {}", finding.source_tool);
            if let Some(secret) = &finding.redacted_secret {
                let _ = writeln!(out, "   - Secret: {}", secret);
            }
            if let Some(author) = &finding.author {
                let _ = writeln!(out, "   - Who: {}", author);
            }
            match (&finding.commit, &finding.timestamp) {
                (Some(commit), Some(when)) => {
                    let _ = writeln!(out, "   - When: {} (commit {})", when, commit);
                }
                (Some(commit), None) => {
                    let _ = writeln!(out, "   - Commit: {}", commit);
                }
                (None, Some(when)) => {
                    let _ = writeln!(out, "   - When: {}", when);
                }
                (None, None) => {}
            }
            let _ = writeln!(out, "   - Recommended action: {}", recommended_action(finding));
        }
    }

    if !clean.is_empty() && !findings.is_empty() {
        out.push_str("\n## Repositories without findings\n");
        for repo in &clean {
            let _ = writeln!(out, "- {}", repo);
        }
    }

    if !failures.is_empty() {
        out.push_str("\n## Tool errors\n");
        for (repo, failure) in &failures {
            let _ = writeln!(out, "- {} on {}: {}", failure.tool, repo, failure.reason);
        }
        out.push_str("Coverage is partial where a scanner failed.\n");
    }

    out.push_str("\n## Next steps\n");
    if findings.is_empty() {
        out.push_str("- No action needed for the scanned history.\n");
        if !failures.is_empty() {
            out.push_str("- Re-run the failed scanners before relying on this result.\n");
        }
    } else {
        out.push_str("- Rotate every listed credential, starting with critical ones.\n");
        out.push_str("- Purge the secrets from git history and force-push the cleaned branches.\n");
        out.push_str("- Add secret scanning to CI to stop new leaks.\n");
    }

    out.trim_end().to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::orchestrator::Message;
    use serde_json::json;

    fn finding(repo: &str, verified: bool) -> FindingRecord {
        let status = if verified {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Unverified
        };
        FindingRecord::new("trufflehog", repo, json!({}))
            .with_location(Some("config.py".into()), Some(12))
            .with_kind(Some("AWS".into()))
            .with_verification(status)
            .with_provenance(Some("9a1b2c3".into()), Some("dev@acme.test".into()), None)
    }

    #[test]
    fn test_report_lists_findings_with_severity() {
        let outcomes = vec![
            RepositoryOutcome::Findings {
                repository: "https://github.com/acme/bank".into(),
                findings: vec![finding("https://github.com/acme/bank", true)],
                tool_errors: vec![],
            },
            RepositoryOutcome::NoFindings {
                repository: "https://github.com/acme/site".into(),
                tool_errors: vec![],
            },
        ];

        let report = render_report(&outcomes);

        assert!(report.contains("1. [CRITICAL] AWS (verified) in https://github.com/acme/bank"));
        assert!(report.contains("Where: config.py:12"));
        assert!(report.contains("Who: dev@acme.test"));
        assert!(report.contains("Commit: 9a1b2c3"));
        assert!(report.contains("Revoke and rotate"));
        assert!(report.contains("## Repositories without findings\n- https://github.com/acme/site"));
        assert!(!report.contains("2. ["));
    }

    #[test]
    fn test_report_orders_by_severity() {
        let outcomes = vec![RepositoryOutcome::Findings {
            repository: "r".into(),
            findings: vec![finding("r", false), finding("r", true)],
            tool_errors: vec![],
        }];

        let report = render_report(&outcomes);
        let critical = report.find("[CRITICAL]").unwrap();
        let high = report.find("[HIGH]").unwrap();
        assert!(critical < high);
    }

    #[test]
    fn test_report_without_findings_says_so() {
        let outcomes = vec![RepositoryOutcome::NoFindings {
            repository: "https://github.com/acme/site".into(),
            tool_errors: vec![ToolFailure {
                tool: "gitleaks".into(),
                reason: "git clone exited with code 128".into(),
            }],
        }];

        let report = render_report(&outcomes);
        assert!(report.contains("No sensitive information was found in 1 scanned repositories."));
        assert!(report.contains("gitleaks on https://github.com/acme/site: git clone exited"));
        assert!(report.contains("Re-run the failed scanners"));
    }

    #[tokio::test]
    async fn test_handoff_without_results_terminates() {
        let mut transcript = Transcript::seeded("hdfc");
        transcript
            .append(Message::new(
                "search",
                "HANDOFF TO report: No GitHub results found for this query",
                MessageKind::Handoff {
                    target: REPORT.into(),
                    reason: "No GitHub results found for this query".into(),
                },
            ))
            .unwrap();

        let agent = ReportAgent::new("report");
        let replies = agent.act(&TurnContext::new(&transcript, 3)).await.unwrap();

        assert_eq!(replies[0].kind, MessageKind::Terminate);
        assert_eq!(
            replies[0].content,
            "No sensitive information was found. No GitHub results found for this query."
        );
    }

    #[tokio::test]
    async fn test_nothing_scanned_hands_off_to_scan() {
        let transcript = Transcript::seeded("hdfc");
        let agent = ReportAgent::new("report");

        let replies = agent.act(&TurnContext::new(&transcript, 3)).await.unwrap();
        assert_eq!(
            replies[0].kind,
            MessageKind::Handoff {
                target: SCAN.into(),
                reason: "No scan results to summarize yet".into(),
            }
        );
    }
}
