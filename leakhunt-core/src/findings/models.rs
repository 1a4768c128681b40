//! Finding data models

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Severity level for findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Whether the scanner confirmed the secret is live
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Unverified,
    #[default]
    Unknown,
}

impl VerificationStatus {
    /// Verified secrets are live credentials; everything else is a hard-coded
    /// secret that still needs rotating.
    pub fn severity(&self) -> Severity {
        match self {
            VerificationStatus::Verified => Severity::Critical,
            VerificationStatus::Unverified | VerificationStatus::Unknown => Severity::High,
        }
    }

    /// Higher is stronger evidence; a negative verification ranks lowest
    pub fn rank(&self) -> u8 {
        match self {
            VerificationStatus::Verified => 2,
            VerificationStatus::Unknown => 1,
            VerificationStatus::Unverified => 0,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Unverified => write!(f, "unverified"),
            VerificationStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// One detected secret exposure, independent of the tool that found it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindingRecord {
    pub source_tool: String,
    pub repository: String,
    pub file_path: Option<String>,
    pub line: Option<u64>,
    pub secret_kind: Option<String>,
    pub verification_status: VerificationStatus,
    pub severity: Severity,
    pub commit: Option<String>,
    pub author: Option<String>,
    pub timestamp: Option<String>,
    /// First and last characters of the secret, never the full value
    pub redacted_secret: Option<String>,
    /// Original tool record, kept for audit
    pub raw: Value,
}

impl FindingRecord {
    /// Create a finding with only provenance set
    pub fn new(source_tool: impl Into<String>, repository: impl Into<String>, raw: Value) -> Self {
        Self {
            source_tool: source_tool.into(),
            repository: repository.into(),
            file_path: None,
            line: None,
            secret_kind: None,
            verification_status: VerificationStatus::Unknown,
            severity: VerificationStatus::Unknown.severity(),
            commit: None,
            author: None,
            timestamp: None,
            redacted_secret: None,
            raw,
        }
    }

    pub fn with_location(mut self, file_path: Option<String>, line: Option<u64>) -> Self {
        self.file_path = file_path.filter(|p| !p.is_empty());
        self.line = line.filter(|l| *l > 0);
        self
    }

    pub fn with_kind(mut self, kind: Option<String>) -> Self {
        self.secret_kind = kind.filter(|k| !k.is_empty());
        self
    }

    pub fn with_verification(mut self, status: VerificationStatus) -> Self {
        self.verification_status = status;
        self.severity = status.severity();
        self
    }

    pub fn with_provenance(
        mut self,
        commit: Option<String>,
        author: Option<String>,
        timestamp: Option<String>,
    ) -> Self {
        self.commit = commit.filter(|c| !c.is_empty());
        self.author = author.filter(|a| !a.is_empty());
        self.timestamp = timestamp.filter(|t| !t.is_empty());
        self
    }

    pub fn with_secret(mut self, secret: Option<&str>) -> Self {
        self.redacted_secret = secret.filter(|s| !s.is_empty()).map(redact);
        self
    }

    /// `file:line`, or whatever part of it is known
    pub fn location(&self) -> String {
        match (&self.file_path, self.line) {
            (Some(file), Some(line)) => format!("{}:{}", file, line),
            (Some(file), None) => file.clone(),
            (None, Some(line)) => format!("line {}", line),
            (None, None) => "unknown location".to_string(),
        }
    }
}

/// Keep the first and last four characters of long secrets
pub fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars.iter().take(4).collect();
        let tail: String = chars.iter().skip(chars.len() - 4).collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}

/// A tool that failed against one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub tool: String,
    pub reason: String,
}

/// Aggregated scan result for one repository
///
/// `NoFindings` is an explicit marker: the scanners ran and reported nothing
/// (or failed, see `tool_errors`). It is never produced for a repository that
/// has not been scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepositoryOutcome {
    NoFindings {
        repository: String,
        tool_errors: Vec<ToolFailure>,
    },
    Findings {
        repository: String,
        findings: Vec<FindingRecord>,
        tool_errors: Vec<ToolFailure>,
    },
}

impl RepositoryOutcome {
    pub fn repository(&self) -> &str {
        match self {
            Self::NoFindings { repository, .. } | Self::Findings { repository, .. } => repository,
        }
    }

    pub fn findings(&self) -> &[FindingRecord] {
        match self {
            Self::NoFindings { .. } => &[],
            Self::Findings { findings, .. } => findings,
        }
    }

    pub fn tool_errors(&self) -> &[ToolFailure] {
        match self {
            Self::NoFindings { tool_errors, .. } | Self::Findings { tool_errors, .. } => {
                tool_errors
            }
        }
    }

    pub fn has_findings(&self) -> bool {
        matches!(self, Self::Findings { .. })
    }
}
