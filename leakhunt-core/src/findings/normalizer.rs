//! Scanner output normalization
//!
//! Each scanner reports secrets in its own JSON shape. The parsers here pull
//! the fields they can find into a [`FindingRecord`] and always keep the
//! original record in `raw`; a record that matches none of the expected
//! fields still becomes a finding with provenance only.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::tools::{ToolOutput, ToolResult, GITLEAKS, TRUFFLEHOG};

use super::models::{FindingRecord, RepositoryOutcome, ToolFailure, VerificationStatus};

/// Trait for scanner output normalization
pub trait ScannerOutput {
    fn to_finding_records(&self, repository: &str) -> Vec<FindingRecord>;
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrufflehogRecord {
    #[serde(rename = "SourceMetadata")]
    source_metadata: TrufflehogSourceMetadata,
    #[serde(rename = "DetectorName")]
    detector_name: Option<String>,
    #[serde(rename = "Verified")]
    verified: bool,
    #[serde(rename = "VerificationError")]
    verification_error: Option<String>,
    #[serde(rename = "Raw")]
    raw: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrufflehogSourceMetadata {
    #[serde(rename = "Data")]
    data: TrufflehogData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrufflehogData {
    #[serde(rename = "Git")]
    git: Option<TrufflehogGit>,
    #[serde(rename = "Github")]
    github: Option<TrufflehogGit>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrufflehogGit {
    commit: Option<String>,
    file: Option<String>,
    email: Option<String>,
    timestamp: Option<String>,
    line: Option<u64>,
}

/// Records from trufflehog's JSON lines
#[derive(Debug)]
pub struct TrufflehogOutput<'a>(pub &'a [Value]);

impl ScannerOutput for TrufflehogOutput<'_> {
    fn to_finding_records(&self, repository: &str) -> Vec<FindingRecord> {
        self.0
            .iter()
            .map(|raw| {
                let finding = FindingRecord::new(TRUFFLEHOG, repository, raw.clone());
                let Ok(record) = serde_json::from_value::<TrufflehogRecord>(raw.clone()) else {
                    return finding;
                };

                let verification = if record.verified {
                    VerificationStatus::Verified
                } else if record
                    .verification_error
                    .as_deref()
                    .is_some_and(|e| !e.is_empty())
                {
                    VerificationStatus::Unknown
                } else {
                    VerificationStatus::Unverified
                };

                let git = record
                    .source_metadata
                    .data
                    .git
                    .or(record.source_metadata.data.github)
                    .unwrap_or_default();

                finding
                    .with_location(git.file, git.line)
                    .with_kind(record.detector_name)
                    .with_verification(verification)
                    .with_provenance(git.commit, git.email, git.timestamp)
                    .with_secret(record.raw.as_deref())
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GitleaksRecord {
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "File")]
    file: Option<String>,
    #[serde(rename = "StartLine")]
    start_line: Option<u64>,
    #[serde(rename = "RuleID")]
    rule_id: Option<String>,
    #[serde(rename = "Secret")]
    secret: Option<String>,
    #[serde(rename = "Commit")]
    commit: Option<String>,
    #[serde(rename = "Author")]
    author: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "Date")]
    date: Option<String>,
}

/// Records from a gitleaks JSON report
#[derive(Debug)]
pub struct GitleaksOutput<'a>(pub &'a [Value]);

impl ScannerOutput for GitleaksOutput<'_> {
    fn to_finding_records(&self, repository: &str) -> Vec<FindingRecord> {
        self.0
            .iter()
            .map(|raw| {
                // gitleaks never verifies, so these stay Unknown
                let finding = FindingRecord::new(GITLEAKS, repository, raw.clone());
                let Ok(record) = serde_json::from_value::<GitleaksRecord>(raw.clone()) else {
                    return finding;
                };

                let author = match (record.author, record.email) {
                    (Some(name), Some(email)) if !name.is_empty() && !email.is_empty() => {
                        Some(format!("{} <{}>", name, email))
                    }
                    (Some(name), _) if !name.is_empty() => Some(name),
                    (_, email) => email,
                };

                finding
                    .with_location(record.file, record.start_line)
                    .with_kind(record.rule_id.or(record.description))
                    .with_provenance(record.commit, author, record.date)
                    .with_secret(record.secret.as_deref())
            })
            .collect()
    }
}

/// Normalize raw records from a named scanner
pub fn normalize(tool: &str, repository: &str, records: &[Value]) -> Vec<FindingRecord> {
    match tool {
        TRUFFLEHOG => TrufflehogOutput(records).to_finding_records(repository),
        GITLEAKS => GitleaksOutput(records).to_finding_records(repository),
        _ => records
            .iter()
            .map(|raw| FindingRecord::new(tool, repository, raw.clone()))
            .collect(),
    }
}

/// Collapse findings that point at the same file and line
///
/// Two scanners often report the same secret. The finding with the stronger
/// verification evidence wins and keeps the earlier position. Findings without
/// a full location are never merged.
pub fn dedupe(findings: Vec<FindingRecord>) -> Vec<FindingRecord> {
    let mut kept: Vec<FindingRecord> = Vec::with_capacity(findings.len());
    let mut index: HashMap<(String, String, u64), usize> = HashMap::new();

    for finding in findings {
        let key = match (&finding.file_path, finding.line) {
            (Some(file), Some(line)) => (finding.repository.clone(), file.clone(), line),
            _ => {
                kept.push(finding);
                continue;
            }
        };

        match index.get(&key) {
            Some(&pos) => {
                if let Some(existing) = kept.get_mut(pos) {
                    if finding.verification_status.rank() > existing.verification_status.rank() {
                        *existing = finding;
                    }
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(finding);
            }
        }
    }

    kept
}

/// Combine every scanner result for one repository
///
/// Scanner failures are kept as [`ToolFailure`]s next to whatever the other
/// scanners found. When nothing was found at all the explicit `NoFindings`
/// marker is returned.
pub fn aggregate(repository: &str, results: Vec<(String, ToolResult)>) -> RepositoryOutcome {
    let mut findings = Vec::new();
    let mut tool_errors = Vec::new();

    for (tool, result) in results {
        match result {
            Ok(ToolOutput::Records(records)) => {
                findings.extend(normalize(&tool, repository, &records));
            }
            Ok(other) => tool_errors.push(ToolFailure {
                tool,
                reason: format!("unexpected output with {} item(s)", other.len()),
            }),
            Err(e) => {
                tracing::warn!(%tool, %repository, "scanner failed: {}", e);
                tool_errors.push(ToolFailure {
                    tool,
                    reason: e.to_string(),
                });
            }
        }
    }

    let findings = dedupe(findings);
    if findings.is_empty() {
        RepositoryOutcome::NoFindings {
            repository: repository.to_string(),
            tool_errors,
        }
    } else {
        RepositoryOutcome::Findings {
            repository: repository.to_string(),
            findings,
            tool_errors,
        }
    }
}
